//! Relational table model
//!
//! Derived per compilation and never persisted: the DDL compiler produces a
//! tree of [`TableSpec`]s and the insert compiler a tree of [`InsertBatch`]es.

use super::enums::SqlType;
use serde::{Deserialize, Serialize};

/// Link from a child table to the row of its parent table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLink {
    /// Normalized parent table name
    pub table: String,
    /// Normalized parent primary key column
    pub column: String,
    /// Type of the parent primary key
    pub id_type: SqlType,
}

impl ParentLink {
    pub fn new(table: impl Into<String>, column: impl Into<String>, id_type: SqlType) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            id_type,
        }
    }

    /// Name of the foreign key column in the child table (`<table>_<column>`)
    pub fn foreign_key_column(&self) -> String {
        crate::validation::identifiers::normalize_identifier(&format!(
            "{}_{}",
            self.table, self.column
        ))
    }
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: SqlType,
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        Self {
            name: name.into(),
            data_type,
            constraints: Vec::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.push("NOT NULL".to_string());
        self
    }
}

/// How a table's primary key was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeySource {
    /// The configured id field was present in the sample
    Configured,
    /// A field named `id` or ending in `_id` was found
    Detected,
    /// No candidate: an auto-increment `id` column was added
    Synthesized,
}

/// A table derived from one JSON sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub name: String,
    pub id_column: String,
    pub id_type: SqlType,
    pub key_source: KeySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentLink>,
    /// Columns in declaration order, key and foreign key columns included
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub children: Vec<TableSpec>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns that are neither the primary key nor the parent foreign key
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        let fk = self.parent.as_ref().map(|p| p.foreign_key_column());
        self.columns
            .iter()
            .filter(move |c| c.name != self.id_column && Some(&c.name) != fk.as_ref())
    }

    /// This table followed by all descendants, depth first
    pub fn flatten(&self) -> Vec<&TableSpec> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}

/// A multi-row insert for one table plus the inserts of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertBatch {
    pub table_name: String,
    /// Sorted column names
    pub columns: Vec<String>,
    /// One formatted SQL literal per column, per row
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub child_batches: Vec<InsertBatch>,
}

impl InsertBatch {
    /// This batch followed by all descendant batches, in emission order
    pub fn flatten(&self) -> Vec<&InsertBatch> {
        let mut out = vec![self];
        for child in &self.child_batches {
            out.extend(child.flatten());
        }
        out
    }
}
