//! PostgreSQL DDL compiler.
//!
//! Decomposes one JSON sample into linked `CREATE TABLE` statements. Nested
//! objects, and arrays whose first element is an object, become child tables
//! named `<table>_<field>` that carry a `NOT NULL` foreign key
//! `<table>_<id>` back to their parent. Everything else becomes a column.
//!
//! All table and column names go through
//! [`normalize_identifier`](crate::validation::identifiers::normalize_identifier),
//! so they never need quoting.

use crate::export::{ExportError, ExportResult};
use crate::models::{
    ColumnSpec, JsonObject, JsonValue, KeySource, ParentLink, SqlType, TableSpec,
};
use crate::validation::identifiers::{is_id_like, normalize_identifier, normalize_identifier_or};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Default table name when none is configured
pub const DEFAULT_TABLE_NAME: &str = "generic";

/// Default limit on nested tables below the root
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Largest value that still fits a 32-bit `INTEGER` column
const MAX_INTEGER: f64 = 2_147_483_647.0;

static ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,6})?(Z|[+-]\d{2}:?\d{2})?$")
        .expect("timestamp pattern is valid")
});

/// Options for DDL generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DdlOptions {
    /// Root table name, normalized before use
    pub table_name: String,
    /// Field holding the root table's primary key
    pub id_field: Option<String>,
    /// Set when compiling a child table on its own
    #[serde(skip)]
    pub parent: Option<ParentLink>,
    /// Infer `TIMESTAMPTZ` for ISO-8601 timestamp strings
    pub detect_timestamps: bool,
    /// Column type overrides keyed by JSON type name (`string`, `boolean`)
    pub custom_types: BTreeMap<String, SqlType>,
    /// Maximum nesting depth of child tables
    pub max_depth: usize,
}

impl Default for DdlOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            id_field: None,
            parent: None,
            detect_timestamps: false,
            custom_types: BTreeMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DdlOptions {
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

    pub fn with_parent(mut self, parent: ParentLink) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_timestamp_detection(mut self, enabled: bool) -> Self {
        self.detect_timestamps = enabled;
        self
    }

    pub fn with_custom_type(mut self, json_type: impl Into<String>, sql_type: SqlType) -> Self {
        self.custom_types.insert(json_type.into(), sql_type);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Column type for a sample value, honouring custom type overrides
    pub fn column_type(&self, value: &JsonValue) -> SqlType {
        if matches!(value, JsonValue::String(_) | JsonValue::Bool(_)) {
            if let Some(custom) = self.custom_types.get(value.type_name()) {
                return *custom;
            }
        }
        infer_column_type(value, self.detect_timestamps)
    }
}

/// Infer the column type of a sample value.
///
/// | value | type |
/// |---|---|
/// | `null` | `TEXT` |
/// | date | `TIMESTAMPTZ` |
/// | integer above 2147483647 in magnitude | `BIGINT` |
/// | other integer | `INTEGER` |
/// | other number | `NUMERIC` |
/// | boolean | `BOOLEAN` |
/// | array, object | `JSONB` |
/// | string | `TEXT` (`TIMESTAMPTZ` for ISO-8601 with `detect_timestamps`) |
pub fn infer_column_type(value: &JsonValue, detect_timestamps: bool) -> SqlType {
    match value {
        JsonValue::Null => SqlType::Text,
        JsonValue::Date(_) => SqlType::TimestampTz,
        JsonValue::Number(_) if value.is_integer() => match value.as_f64() {
            Some(n) if n.abs() > MAX_INTEGER => SqlType::BigInt,
            _ => SqlType::Integer,
        },
        JsonValue::Number(_) => SqlType::Numeric,
        JsonValue::Bool(_) => SqlType::Boolean,
        JsonValue::Array(_) | JsonValue::Object(_) => SqlType::Jsonb,
        JsonValue::String(s) if detect_timestamps && ISO_TIMESTAMP.is_match(s) => {
            SqlType::TimestampTz
        }
        JsonValue::String(_) => SqlType::Text,
    }
}

/// The primary key chosen for a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedId<'a> {
    /// Normalized column name
    pub column: String,
    /// Sample key holding the id value; `None` when synthesized
    pub field: Option<&'a str>,
    pub source: KeySource,
}

impl ResolvedId<'_> {
    /// Column type of the key; `SERIAL` when synthesized
    pub fn sql_type(&self, sample: &JsonObject, options: &DdlOptions) -> SqlType {
        match self.field.and_then(|f| sample.get(f)) {
            Some(value) => options.column_type(value),
            None => SqlType::Serial,
        }
    }
}

/// Resolve the primary key of a table from its sample row.
///
/// The configured `id_field` wins when present in the sample. Otherwise the
/// first key that is `id` or ends in `_id` (case-insensitive) is used,
/// skipping the parent foreign key. With no candidate an `id` column is
/// synthesized.
pub fn resolve_id_column<'a>(
    sample: &'a JsonObject,
    id_field: Option<&str>,
    parent: Option<&ParentLink>,
) -> ResolvedId<'a> {
    if let Some(configured) = id_field {
        if let Some((key, _)) = sample.iter().find(|(key, _)| *key == configured) {
            return ResolvedId {
                column: normalize_identifier_or(key, "id"),
                field: Some(key),
                source: KeySource::Configured,
            };
        }
    }

    let foreign_key = parent.map(ParentLink::foreign_key_column);
    let detected = sample.keys().find(|key| {
        is_id_like(key) && foreign_key.as_deref() != Some(normalize_identifier(key).as_str())
    });
    match detected {
        Some(key) => ResolvedId {
            column: normalize_identifier_or(key, "id"),
            field: Some(key),
            source: KeySource::Detected,
        },
        None => ResolvedId {
            column: "id".to_string(),
            field: None,
            source: KeySource::Synthesized,
        },
    }
}

/// The object a sample decomposes from: the value itself, or the first
/// element of an array of objects.
pub(crate) fn sample_object(value: &JsonValue) -> Result<&JsonObject, ExportError> {
    match value {
        JsonValue::Object(object) => Ok(object),
        JsonValue::Array(items) => match items.first() {
            Some(JsonValue::Object(object)) => Ok(object),
            Some(other) => Err(ExportError::UnexpectedValue {
                expected: "object",
                found: other.type_name(),
            }),
            None => Err(ExportError::EmptyInput("sample".to_string())),
        },
        other => Err(ExportError::UnexpectedValue {
            expected: "object",
            found: other.type_name(),
        }),
    }
}

/// Decompose a JSON sample into a tree of tables.
pub fn compile_tables(sample: &JsonValue, options: &DdlOptions) -> Result<TableSpec, ExportError> {
    let object = sample_object(sample)?;
    let name = normalize_identifier_or(&options.table_name, DEFAULT_TABLE_NAME);
    let table = compile_object(
        object,
        name,
        options.parent.clone(),
        options.id_field.as_deref(),
        0,
        options,
    )?;
    debug!(
        "Compiled {} table(s) from sample for `{}`",
        table.flatten().len(),
        table.name
    );
    Ok(table)
}

fn compile_object(
    object: &JsonObject,
    name: String,
    parent: Option<ParentLink>,
    id_field: Option<&str>,
    depth: usize,
    options: &DdlOptions,
) -> Result<TableSpec, ExportError> {
    if depth > options.max_depth {
        return Err(ExportError::DepthLimitExceeded {
            depth,
            max: options.max_depth,
        });
    }

    let id = resolve_id_column(object, id_field, parent.as_ref());
    let id_type = id.sql_type(object, options);
    let mut columns: Vec<ColumnSpec> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    if let Some(link) = &parent {
        let fk = link.foreign_key_column();
        seen.insert(fk.clone());
        columns.push(ColumnSpec::new(fk, link.id_type).not_null());
    }
    if id.source == KeySource::Synthesized {
        seen.insert(id.column.clone());
        columns.push(ColumnSpec::new(id.column.clone(), SqlType::Serial));
    }

    let link_for_children = ParentLink::new(name.clone(), id.column.clone(), id_type.reference_type());
    let mut children = Vec::new();

    for (key, value) in object.iter() {
        let column = normalize_identifier_or(key, "column");
        if value.is_nested() {
            let child_sample = match value {
                JsonValue::Array(items) => items.first().and_then(JsonValue::as_object),
                other => other.as_object(),
            };
            if let Some(child_sample) = child_sample {
                let child_name = normalize_identifier(&format!("{name}_{column}"));
                children.push(compile_object(
                    child_sample,
                    child_name,
                    Some(link_for_children.clone()),
                    None,
                    depth + 1,
                    options,
                )?);
            }
            continue;
        }

        if !seen.insert(column.clone()) {
            warn!("Skipping field `{key}` in `{name}`: column `{column}` already exists");
            continue;
        }
        columns.push(ColumnSpec::new(column, options.column_type(value)));
    }

    Ok(TableSpec {
        name,
        id_column: id.column,
        id_type,
        key_source: id.source,
        parent,
        columns,
        children,
    })
}

/// Exporter for PostgreSQL `CREATE TABLE` statements.
///
/// # Example
///
/// ```rust
/// use data_conversion_sdk::export::sql::{DdlOptions, SQLExporter};
/// use data_conversion_sdk::models::JsonValue;
///
/// let sample = JsonValue::parse(r#"{"a": 1, "b": {"x": "y"}}"#).unwrap();
/// let result = SQLExporter.export(&sample, &DdlOptions::new("t")).unwrap();
/// assert!(result.content.contains("CREATE TABLE t_b ("));
/// assert!(result.content.contains("FOREIGN KEY (t_id) REFERENCES t(id)"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SQLExporter;

impl SQLExporter {
    /// Render one table (without its children) as a `CREATE TABLE` statement.
    pub fn export_table(table: &TableSpec) -> String {
        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let mut line = format!("  {} {}", column.name, column.data_type);
                if !column.constraints.is_empty() {
                    line.push(' ');
                    line.push_str(&column.constraints.join(" "));
                }
                line
            })
            .collect();

        lines.push(format!("  PRIMARY KEY ({})", table.id_column));
        if let Some(parent) = &table.parent {
            lines.push(format!(
                "  FOREIGN KEY ({}) REFERENCES {}({})",
                parent.foreign_key_column(),
                parent.table,
                parent.column
            ));
        }

        format!("CREATE TABLE {} (\n{}\n);", table.name, lines.join(",\n"))
    }

    /// Render a table tree, parents before children.
    pub fn export_tables(table: &TableSpec) -> String {
        table
            .flatten()
            .into_iter()
            .map(Self::export_table)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Compile a JSON sample into DDL (SDK interface).
    pub fn export(&self, sample: &JsonValue, options: &DdlOptions) -> Result<ExportResult, ExportError> {
        Ok(ExportResult {
            content: generate_schema(sample, options)?,
            format: "sql".to_string(),
        })
    }
}

/// Compile a JSON sample into `CREATE TABLE` statements separated by blank lines.
pub fn generate_schema(sample: &JsonValue, options: &DdlOptions) -> Result<String, ExportError> {
    let table = compile_tables(sample, options)?;
    Ok(SQLExporter::export_tables(&table))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str) -> JsonValue {
        JsonValue::parse(text).unwrap()
    }

    fn column_names(table: &TableSpec) -> Vec<&str> {
        table.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(infer_column_type(&JsonValue::Null, false), SqlType::Text);
        assert_eq!(infer_column_type(&sample("42"), false), SqlType::Integer);
        assert_eq!(infer_column_type(&sample("2147483647"), false), SqlType::Integer);
        assert_eq!(infer_column_type(&sample("2147483648"), false), SqlType::BigInt);
        assert_eq!(infer_column_type(&sample("-3000000000"), false), SqlType::BigInt);
        assert_eq!(infer_column_type(&sample("1.5"), false), SqlType::Numeric);
        assert_eq!(infer_column_type(&sample("true"), false), SqlType::Boolean);
        assert_eq!(infer_column_type(&sample("[1]"), false), SqlType::Jsonb);
        assert_eq!(infer_column_type(&sample("{}"), false), SqlType::Jsonb);
        assert_eq!(infer_column_type(&sample("\"hi\""), false), SqlType::Text);

        let ts = sample("\"2024-01-15T10:30:00.000Z\"");
        assert_eq!(infer_column_type(&ts, false), SqlType::Text);
        assert_eq!(infer_column_type(&ts, true), SqlType::TimestampTz);
        assert_eq!(infer_column_type(&sample("\"2024-01-15\""), true), SqlType::Text);
    }

    #[test]
    fn test_foreign_key_scenario() {
        let ddl = generate_schema(&sample(r#"{"a": 1, "b": {"x": "y"}}"#), &DdlOptions::new("t")).unwrap();
        assert_eq!(
            ddl,
            "CREATE TABLE t (\n  id SERIAL,\n  a INTEGER,\n  PRIMARY KEY (id)\n);\n\n\
             CREATE TABLE t_b (\n  t_id INTEGER NOT NULL,\n  id SERIAL,\n  x TEXT,\n  PRIMARY KEY (id),\n  \
             FOREIGN KEY (t_id) REFERENCES t(id)\n);"
        );
    }

    #[test]
    fn test_detected_id_is_kept_as_column() {
        let table = compile_tables(
            &sample(r#"{"name": "x", "order_id": 7, "items": [{"sku": "a"}]}"#),
            &DdlOptions::new("Orders"),
        )
        .unwrap();
        assert_eq!(table.name, "orders");
        assert_eq!(table.id_column, "order_id");
        assert_eq!(table.key_source, KeySource::Detected);
        assert_eq!(column_names(&table), vec!["name", "order_id"]);

        let child = &table.children[0];
        assert_eq!(child.name, "orders_items");
        assert_eq!(column_names(child), vec!["orders_order_id", "id", "sku"]);
        assert_eq!(child.columns[0].data_type, SqlType::Integer);
    }

    #[test]
    fn test_configured_id_field() {
        let table = compile_tables(
            &sample(r#"{"id": 1, "code": "abc", "v": 2}"#),
            &DdlOptions::new("t").with_id_field("code"),
        )
        .unwrap();
        assert_eq!(table.id_column, "code");
        assert_eq!(table.id_type, SqlType::Text);
        assert_eq!(table.key_source, KeySource::Configured);
        assert_eq!(column_names(&table), vec!["id", "code", "v"]);

        // Missing configured field falls back to detection
        let table = compile_tables(
            &sample(r#"{"id": 1}"#),
            &DdlOptions::new("t").with_id_field("uuid"),
        )
        .unwrap();
        assert_eq!(table.key_source, KeySource::Detected);
    }

    #[test]
    fn test_child_of_text_keyed_parent() {
        let ddl = generate_schema(
            &sample(r#"{"id": "u1", "address": {"city": "NYC"}}"#),
            &DdlOptions::new("user_account"),
        )
        .unwrap();
        assert!(ddl.contains("  user_account_id TEXT NOT NULL,"));
        assert!(ddl.contains("FOREIGN KEY (user_account_id) REFERENCES user_account(id)"));
    }

    #[test]
    fn test_arrays() {
        let table = compile_tables(
            &sample(r#"{"tags": ["x"], "empty": [], "rows": [{"v": 1.5}], "objs": {}}"#),
            &DdlOptions::default(),
        )
        .unwrap();
        assert_eq!(table.name, "generic");
        assert_eq!(column_names(&table), vec!["id", "tags", "empty"]);
        assert!(table.columns[1..].iter().all(|c| c.data_type == SqlType::Jsonb));
        let children: Vec<&str> = table.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, vec!["generic_rows", "generic_objs"]);
        assert_eq!(table.children[0].columns[2].data_type, SqlType::Numeric);
    }

    #[test]
    fn test_statement_order_is_depth_first() {
        let table = compile_tables(
            &sample(r#"{"a": {"b": {"c": 1}}, "d": {"e": 2}}"#),
            &DdlOptions::new("r"),
        )
        .unwrap();
        let order: Vec<&str> = table.flatten().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["r", "r_a", "r_a_b", "r_d"]);
        assert_eq!(
            table.children[0].children[0].parent.as_ref().unwrap().foreign_key_column(),
            "r_a_id"
        );
    }

    #[test]
    fn test_duplicate_columns_skipped() {
        let table = compile_tables(
            &sample(r#"{"userName": "a", "user_name": "b", "t_id": 3}"#),
            &DdlOptions::new("x"),
        )
        .unwrap();
        assert_eq!(column_names(&table), vec!["user_name", "t_id"]);
    }

    #[test]
    fn test_custom_types_and_timestamps() {
        let options = DdlOptions::new("t")
            .with_custom_type("string", SqlType::Varchar)
            .with_timestamp_detection(true);
        let table = compile_tables(&sample(r#"{"s": "x", "n": 1}"#), &options).unwrap();
        assert_eq!(table.column("s").unwrap().data_type, SqlType::Varchar);
        assert_eq!(table.column("n").unwrap().data_type, SqlType::Integer);
    }

    #[test]
    fn test_depth_limit() {
        let deep = sample(r#"{"a": {"b": {"c": {"d": 1}}}}"#);
        let err = compile_tables(&deep, &DdlOptions::new("t").with_max_depth(2)).unwrap_err();
        assert_eq!(err, ExportError::DepthLimitExceeded { depth: 3, max: 2 });
        assert!(compile_tables(&deep, &DdlOptions::new("t").with_max_depth(3)).is_ok());
    }

    #[test]
    fn test_non_object_sample() {
        assert!(matches!(
            compile_tables(&sample("42"), &DdlOptions::default()),
            Err(ExportError::UnexpectedValue { found: "number", .. })
        ));
        let from_array = compile_tables(&sample(r#"[{"a": true}]"#), &DdlOptions::default()).unwrap();
        assert_eq!(from_array.column("a").unwrap().data_type, SqlType::Boolean);
    }

    #[test]
    fn test_export_result() {
        let result = SQLExporter
            .export(&sample(r#"{"id": 1}"#), &DdlOptions::new("things"))
            .unwrap();
        assert_eq!(result.format, "sql");
        assert_eq!(
            result.content,
            "CREATE TABLE things (\n  id INTEGER,\n  PRIMARY KEY (id)\n);"
        );
    }
}
