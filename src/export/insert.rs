//! PostgreSQL insert compiler.
//!
//! Turns JSON rows into batched multi-row `INSERT` statements using the same
//! decomposition as the DDL compiler in [`super::sql`]: the first row decides
//! which fields are nested, nested values are inserted into
//! `<table>_<field>` with a foreign key to the row they came from, and all
//! other values are written to columns.

use crate::export::sql::{
    DEFAULT_MAX_DEPTH, DEFAULT_TABLE_NAME, infer_column_type, resolve_id_column,
};
use crate::export::{ExportError, ExportResult};
use crate::models::{
    InsertBatch, JsonObject, JsonValue, KeySource, ParentLink, SqlType, format_timestamp,
};
use crate::validation::identifiers::{normalize_identifier, normalize_identifier_or};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Formats a column value as a SQL literal, replacing [`format_value`].
pub type ColumnFormatter = Arc<dyn Fn(&JsonValue) -> String + Send + Sync>;

/// What to do when a row hits the conflict target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictAction {
    /// `DO UPDATE SET col = EXCLUDED.col` for every non-conflict column
    Update,
    #[default]
    Nothing,
}

/// The `RETURNING` clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Returning {
    None,
    /// `RETURNING *`
    #[default]
    All,
    Columns(Vec<String>),
}

/// Options for insert generation.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsertOptions {
    pub table_name: String,
    /// Field holding the root table's primary key
    pub id_field: Option<String>,
    /// Set when inserting child rows on their own
    #[serde(skip)]
    pub parent: Option<ParentLink>,
    /// Foreign key value written to every row when `parent` is set
    #[serde(skip)]
    pub parent_id_value: Option<JsonValue>,
    pub returning: Returning,
    /// Conflict target columns; empty for no `ON CONFLICT` clause
    pub on_conflict: Vec<String>,
    pub on_conflict_action: ConflictAction,
    /// Per-column literal formatters keyed by column name
    #[serde(skip)]
    pub column_formatters: HashMap<String, ColumnFormatter>,
    pub max_depth: usize,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            id_field: None,
            parent: None,
            parent_id_value: None,
            returning: Returning::All,
            on_conflict: Vec::new(),
            on_conflict_action: ConflictAction::Nothing,
            column_formatters: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for InsertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatters: BTreeSet<&String> = self.column_formatters.keys().collect();
        f.debug_struct("InsertOptions")
            .field("table_name", &self.table_name)
            .field("id_field", &self.id_field)
            .field("parent", &self.parent)
            .field("parent_id_value", &self.parent_id_value)
            .field("returning", &self.returning)
            .field("on_conflict", &self.on_conflict)
            .field("on_conflict_action", &self.on_conflict_action)
            .field("column_formatters", &formatters)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl InsertOptions {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = Some(id_field.into());
        self
    }

    pub fn with_parent(mut self, parent: ParentLink, value: JsonValue) -> Self {
        self.parent = Some(parent);
        self.parent_id_value = Some(value);
        self
    }

    pub fn with_returning(mut self, returning: Returning) -> Self {
        self.returning = returning;
        self
    }

    pub fn on_conflict<I, S>(mut self, columns: I, action: ConflictAction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_conflict = columns.into_iter().map(Into::into).collect();
        self.on_conflict_action = action;
        self
    }

    pub fn with_formatter<F>(mut self, column: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&JsonValue) -> String + Send + Sync + 'static,
    {
        self.column_formatters.insert(column.into(), Arc::new(formatter));
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Format a value as a PostgreSQL literal.
///
/// `null` is `NULL`, booleans are `TRUE`/`FALSE`, numbers are written as-is,
/// dates as quoted ISO-8601, objects and arrays as quoted JSON text and
/// strings quoted, with embedded single quotes doubled.
pub fn format_value(value: &JsonValue) -> Result<String, ExportError> {
    let literal = match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(true) => "TRUE".to_string(),
        JsonValue::Bool(false) => "FALSE".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Date(d) => format!("'{}'", format_timestamp(d)),
        JsonValue::Array(_) | JsonValue::Object(_) => quote(&value.to_compact_string()?),
        JsonValue::String(s) => quote(s),
    };
    Ok(literal)
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Where a column's value comes from
#[derive(Debug, Clone)]
enum ColumnSource {
    ForeignKey,
    GeneratedId,
    Field(String),
}

/// Sequential ids handed out per table when the key is synthesized
type IdCounters = BTreeMap<String, i64>;

/// Decompose JSON rows into a tree of insert batches.
pub fn compile_batches(rows: &[JsonValue], options: &InsertOptions) -> Result<InsertBatch, ExportError> {
    let table = normalize_identifier_or(&options.table_name, DEFAULT_TABLE_NAME);
    let objects = rows
        .iter()
        .map(|row| match row {
            JsonValue::Object(object) => Ok(object),
            other => Err(ExportError::UnexpectedValue {
                expected: "object",
                found: other.type_name(),
            }),
        })
        .collect::<Result<Vec<&JsonObject>, ExportError>>()?;

    let parent = match (&options.parent, &options.parent_id_value) {
        (Some(link), Some(value)) => Some((link.clone(), value.clone())),
        (Some(link), None) => Some((link.clone(), JsonValue::Null)),
        _ => None,
    };

    let mut counters = IdCounters::new();
    let batch = compile_rows(
        &objects,
        table,
        parent,
        options.id_field.as_deref(),
        0,
        options,
        &mut counters,
    )?;
    debug!(
        "Compiled {} insert batch(es) for {} row(s) into `{}`",
        batch.flatten().len(),
        rows.len(),
        batch.table_name
    );
    Ok(batch)
}

fn compile_rows(
    rows: &[&JsonObject],
    table: String,
    parent: Option<(ParentLink, JsonValue)>,
    id_field: Option<&str>,
    depth: usize,
    options: &InsertOptions,
    counters: &mut IdCounters,
) -> Result<InsertBatch, ExportError> {
    if depth > options.max_depth {
        return Err(ExportError::DepthLimitExceeded {
            depth,
            max: options.max_depth,
        });
    }
    let Some(sample) = rows.first() else {
        return Err(ExportError::EmptyInput(format!("rows for `{table}`")));
    };

    // The first row fixes which fields are nested for the whole batch
    let nested: Vec<&str> = sample
        .iter()
        .filter(|(_, value)| value.is_nested())
        .map(|(key, _)| key)
        .collect();

    let link = parent.as_ref().map(|(link, _)| link);
    let id = resolve_id_column(sample, id_field, link);
    let assign_ids = id.source == KeySource::Synthesized && !nested.is_empty();

    let mut sources: BTreeMap<String, ColumnSource> = BTreeMap::new();
    if let Some(link) = link {
        sources.insert(link.foreign_key_column(), ColumnSource::ForeignKey);
    }
    if assign_ids {
        sources.insert(id.column.clone(), ColumnSource::GeneratedId);
    }
    for row in rows {
        for key in row.keys() {
            if nested.contains(&key) {
                continue;
            }
            let column = normalize_identifier_or(key, "column");
            match sources.get(&column) {
                Some(ColumnSource::Field(existing)) if existing == key => {}
                Some(_) => {
                    warn!("Skipping field `{key}` in `{table}`: column `{column}` already exists");
                }
                None => {
                    sources.insert(column, ColumnSource::Field(key.to_string()));
                }
            }
        }
    }

    let columns: Vec<String> = sources.keys().cloned().collect();
    let mut literal_rows = Vec::with_capacity(rows.len());
    let mut row_ids = Vec::with_capacity(rows.len());

    for row in rows {
        let row_id = if assign_ids {
            let counter = counters.entry(table.clone()).or_insert(0);
            *counter += 1;
            JsonValue::from_i64(*counter)
        } else {
            id.field
                .and_then(|field| row.get(field))
                .cloned()
                .unwrap_or(JsonValue::Null)
        };

        let mut literals = Vec::with_capacity(columns.len());
        for (column, source) in &sources {
            let value = match source {
                ColumnSource::ForeignKey => parent
                    .as_ref()
                    .map(|(_, value)| value.clone())
                    .unwrap_or(JsonValue::Null),
                ColumnSource::GeneratedId => row_id.clone(),
                ColumnSource::Field(key) => row.get(key).cloned().unwrap_or(JsonValue::Null),
            };
            let formatter = options.column_formatters.get(column).or_else(|| match source {
                ColumnSource::Field(key) => options.column_formatters.get(key),
                _ => None,
            });
            literals.push(match formatter {
                Some(custom) => (**custom)(&value),
                None => format_value(&value)?,
            });
        }
        literal_rows.push(literals);
        row_ids.push(row_id);
    }

    let id_type = match id.source {
        KeySource::Synthesized => SqlType::Integer,
        _ => id
            .field
            .and_then(|field| sample.get(field))
            .map(|value| infer_column_type(value, false).reference_type())
            .unwrap_or(SqlType::Integer),
    };
    let child_link = ParentLink::new(table.clone(), id.column.clone(), id_type);

    let mut child_batches = Vec::new();
    for (row, row_id) in rows.iter().zip(&row_ids) {
        if !nested.is_empty() && row_id.is_null() {
            warn!("Row in `{table}` has no `{}` value; children reference NULL", id.column);
        }
        for key in &nested {
            let child_rows: Vec<&JsonObject> = match row.get(key) {
                Some(JsonValue::Object(object)) => vec![object],
                Some(JsonValue::Array(items)) => items.iter().filter_map(JsonValue::as_object).collect(),
                _ => Vec::new(),
            };
            if child_rows.is_empty() {
                continue;
            }
            let column = normalize_identifier_or(key, "column");
            let child_table = normalize_identifier(&format!("{table}_{column}"));
            child_batches.push(compile_rows(
                &child_rows,
                child_table,
                Some((child_link.clone(), row_id.clone())),
                None,
                depth + 1,
                options,
                counters,
            )?);
        }
    }

    Ok(InsertBatch {
        table_name: table,
        columns,
        rows: literal_rows,
        child_batches,
    })
}

/// Exporter for PostgreSQL `INSERT` statements.
///
/// # Example
///
/// ```rust
/// use data_conversion_sdk::export::insert::{ConflictAction, InsertExporter, InsertOptions};
/// use data_conversion_sdk::models::JsonValue;
///
/// let rows = vec![JsonValue::parse(r#"{"id": 1, "name": "a"}"#).unwrap()];
/// let options = InsertOptions::new("items").on_conflict(["id"], ConflictAction::Update);
/// let sql = InsertExporter.export(&rows, &options).unwrap().content;
/// assert!(sql.contains("ON CONFLICT (id)\nDO UPDATE SET\n  name = EXCLUDED.name"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertExporter;

impl InsertExporter {
    /// Render one batch (without its children) as an `INSERT` statement.
    pub fn export_batch(batch: &InsertBatch, options: &InsertOptions) -> String {
        let mut sql = format!(
            "INSERT INTO {} ({})\nVALUES\n",
            batch.table_name,
            batch.columns.join(", ")
        );
        let values: Vec<String> = batch
            .rows
            .iter()
            .map(|row| format!("({})", row.join(", ")))
            .collect();
        sql.push_str(&values.join(",\n"));

        if !options.on_conflict.is_empty() {
            let target: Vec<String> = options
                .on_conflict
                .iter()
                .map(|c| normalize_identifier_or(c, c))
                .collect();
            sql.push_str(&format!("\nON CONFLICT ({})", target.join(", ")));

            let updates: Vec<&String> = batch
                .columns
                .iter()
                .filter(|c| !target.contains(c))
                .collect();
            if options.on_conflict_action == ConflictAction::Update && !updates.is_empty() {
                sql.push_str("\nDO UPDATE SET\n");
                let assignments: Vec<String> = updates
                    .iter()
                    .map(|c| format!("  {c} = EXCLUDED.{c}"))
                    .collect();
                sql.push_str(&assignments.join(",\n"));
            } else {
                sql.push_str("\nDO NOTHING");
            }
        }

        match &options.returning {
            Returning::None => {}
            Returning::All => sql.push_str("\nRETURNING *"),
            Returning::Columns(columns) => {
                sql.push_str(&format!("\nRETURNING {}", columns.join(", ")))
            }
        }
        sql.push(';');
        sql
    }

    /// Render a batch tree in emission order, separated by blank lines.
    pub fn export_batches(batch: &InsertBatch, options: &InsertOptions) -> String {
        batch
            .flatten()
            .into_iter()
            .map(|b| Self::export_batch(b, options))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Compile rows into insert statements (SDK interface).
    pub fn export(&self, rows: &[JsonValue], options: &InsertOptions) -> Result<ExportResult, ExportError> {
        Ok(ExportResult {
            content: generate_inserts(rows, options)?,
            format: "sql".to_string(),
        })
    }
}

/// Compile rows into `INSERT` statements separated by blank lines.
pub fn generate_inserts(rows: &[JsonValue], options: &InsertOptions) -> Result<String, ExportError> {
    let batch = compile_batches(rows, options)?;
    Ok(InsertExporter::export_batches(&batch, options))
}
