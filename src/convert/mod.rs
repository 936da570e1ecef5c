//! Conversion dispatcher
//!
//! Routes a `(from, to)` format pair to the pipeline that produces the
//! target text:
//!
//! | from \ to | ts | zod | json | pg | go |
//! |---|---|---|---|---|---|
//! | ts | - | TypeToSchema | MockJson | MockSql | MockStruct |
//! | zod | SchemaToType | - | MockJson | MockSql | MockStruct |
//! | json | InferType | InferSchema | - | JsonSql | JsonStruct |
//!
//! Results are delivered through a caller-supplied [`ResultSink`].

pub mod bridge;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConversionConfig};
use crate::export::{ExportError, GoStructExporter, InsertExporter, SQLExporter, StructCodegen};
use crate::export::{insert, sql};
use crate::import::{ImportError, parse_json};
use crate::inference::{InferenceError, infer_schema};
use crate::models::{DataFormat, JsonValue, SchemaDocument};

pub use bridge::{NativeBackend, SchemaBackend, generate_mocks, schema_to_type_text, type_text_to_schema};

/// Error category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Malformed type, schema or JSON text
    Parse,
    /// Format pair absent from the route table
    UnsupportedConversion,
    /// Nothing to convert
    EmptyInput,
    /// Value cannot be represented in the target
    Serialization,
    /// Nesting deeper than the configured limit
    DepthLimit,
}

/// Error during conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Conversion from {from} to {to} is not supported")]
    UnsupportedConversion { from: DataFormat, to: DataFormat },
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::Import(ImportError::MaxDepthExceeded { .. }) => ErrorKind::DepthLimit,
            ConversionError::Import(_) => ErrorKind::Parse,
            ConversionError::Export(ExportError::EmptyInput(_)) => ErrorKind::EmptyInput,
            ConversionError::Export(ExportError::Serialization(_)) => ErrorKind::Serialization,
            ConversionError::Export(
                ExportError::DepthLimitExceeded { .. } | ExportError::CyclicReference(_),
            ) => ErrorKind::DepthLimit,
            ConversionError::Export(
                ExportError::UnresolvedReference(_) | ExportError::UnexpectedValue { .. },
            ) => ErrorKind::Parse,
            ConversionError::Inference(InferenceError::MaxDepthExceeded { .. }) => {
                ErrorKind::DepthLimit
            }
            ConversionError::Inference(InferenceError::NoRecords) => ErrorKind::EmptyInput,
            ConversionError::Config(_) => ErrorKind::Parse,
            ConversionError::UnsupportedConversion { .. } => ErrorKind::UnsupportedConversion,
        }
    }
}

/// A pipeline in the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Type definitions -> schema notation
    TypeToSchema,
    /// Schema notation -> type definitions
    SchemaToType,
    /// Schema -> mock JSON
    MockJson,
    /// Schema -> mock rows -> DDL and DML
    MockSql,
    /// Schema -> mock instance -> struct declaration
    MockStruct,
    /// JSON sample -> inferred type definitions
    InferType,
    /// JSON sample -> inferred schema notation
    InferSchema,
    /// JSON rows -> DDL and DML
    JsonSql,
    /// JSON sample -> struct declaration
    JsonStruct,
}

impl Route {
    /// Look up the pipeline for a format pair.
    pub fn resolve(from: DataFormat, to: DataFormat) -> Option<Route> {
        use DataFormat::*;
        match (from, to) {
            (TypeScript, Zod) => Some(Route::TypeToSchema),
            (Zod, TypeScript) => Some(Route::SchemaToType),
            (TypeScript | Zod, Json) => Some(Route::MockJson),
            (TypeScript | Zod, Postgres) => Some(Route::MockSql),
            (TypeScript | Zod, Go) => Some(Route::MockStruct),
            (Json, TypeScript) => Some(Route::InferType),
            (Json, Zod) => Some(Route::InferSchema),
            (Json, Postgres) => Some(Route::JsonSql),
            (Json, Go) => Some(Route::JsonStruct),
            _ => None,
        }
    }
}

fn default_mock_count() -> usize {
    1
}

/// A single conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub from: DataFormat,
    pub to: DataFormat,
    pub source: String,
    /// Number of mock instances for JSON and SQL targets
    #[serde(default = "default_mock_count")]
    pub mock_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConversionConfig>,
}

impl ConvertRequest {
    pub fn new(from: DataFormat, to: DataFormat, source: impl Into<String>) -> Self {
        Self {
            from,
            to,
            source: source.into(),
            mock_count: default_mock_count(),
            config: None,
        }
    }

    pub fn with_mock_count(mut self, count: usize) -> Self {
        self.mock_count = count;
        self
    }

    pub fn with_config(mut self, config: ConversionConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Receives the outcome of a conversion.
pub trait ResultSink {
    fn deliver(&mut self, result: Result<String, ConversionError>);
}

impl<F> ResultSink for F
where
    F: FnMut(Result<String, ConversionError>),
{
    fn deliver(&mut self, result: Result<String, ConversionError>) {
        self(result)
    }
}

/// Dispatcher over a schema backend.
#[derive(Debug, Clone, Default)]
pub struct Converter<B: SchemaBackend = NativeBackend> {
    backend: B,
}

impl Converter<NativeBackend> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: SchemaBackend> Converter<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Run a request and return the target text.
    pub fn convert(&self, request: &ConvertRequest) -> Result<String, ConversionError> {
        let Some(route) = Route::resolve(request.from, request.to) else {
            warn!(from = %request.from, to = %request.to, "Unsupported conversion");
            return Err(ConversionError::UnsupportedConversion {
                from: request.from,
                to: request.to,
            });
        };
        info!(from = %request.from, to = %request.to, ?route, "Converting");

        let default_config;
        let config = match &request.config {
            Some(config) => config,
            None => {
                default_config = ConversionConfig::default();
                &default_config
            }
        };

        match route {
            Route::TypeToSchema => {
                let doc = self.backend.parse_type_definition(&request.source)?;
                Ok(self.backend.schema_notation_text(&doc))
            }
            Route::SchemaToType => {
                let doc = self.backend.parse_schema_notation(&request.source)?;
                Ok(self.backend.type_definition_text(&doc))
            }
            Route::MockJson => {
                let doc = self.parse_schema(request)?;
                let values = self.backend.generate_conforming_values(
                    &doc,
                    request.mock_count,
                    &config.mock_options(),
                )?;
                Ok(single_or_array(values, request.mock_count)
                    .to_pretty_string()
                    .map_err(ExportError::from)?)
            }
            Route::MockSql => {
                let doc = self.parse_schema(request)?;
                // One shared batch: the first instance is the DDL sample
                let instances = self.backend.generate_conforming_values(
                    &doc,
                    request.mock_count.max(1),
                    &config.mock_options(),
                )?;
                relational(&into_rows(instances), config)
            }
            Route::MockStruct => {
                let doc = self.parse_schema(request)?;
                let values = self.backend.generate_conforming_values(
                    &doc,
                    request.mock_count.max(1),
                    &config.mock_options(),
                )?;
                struct_decl(&single_or_array(values, request.mock_count.max(1)), config)
            }
            Route::InferType => {
                let doc = self.infer(request, config)?;
                Ok(self.backend.type_definition_text(&doc))
            }
            Route::InferSchema => {
                let doc = self.infer(request, config)?;
                Ok(self.backend.schema_notation_text(&doc))
            }
            Route::JsonSql => {
                relational(&into_rows(vec![parse_json(&request.source)?]), config)
            }
            Route::JsonStruct => struct_decl(&parse_json(&request.source)?, config),
        }
    }

    fn parse_schema(&self, request: &ConvertRequest) -> Result<SchemaDocument, ConversionError> {
        Ok(match request.from {
            DataFormat::Zod => self.backend.parse_schema_notation(&request.source)?,
            _ => self.backend.parse_type_definition(&request.source)?,
        })
    }

    fn infer(
        &self,
        request: &ConvertRequest,
        config: &ConversionConfig,
    ) -> Result<SchemaDocument, ConversionError> {
        let value = parse_json(&request.source)?;
        Ok(infer_schema(&value, &config.inference_config())?)
    }
}

fn single_or_array(mut values: Vec<JsonValue>, count: usize) -> JsonValue {
    if count == 1 && values.len() == 1 {
        values.remove(0)
    } else {
        JsonValue::Array(values)
    }
}

/// Array values contribute their elements as rows.
fn into_rows(values: Vec<JsonValue>) -> Vec<JsonValue> {
    values
        .into_iter()
        .flat_map(|value| match value {
            JsonValue::Array(items) => items,
            value => vec![value],
        })
        .collect()
}

/// `CREATE TABLE` statements from the first row, then inserts for all rows.
fn relational(rows: &[JsonValue], config: &ConversionConfig) -> Result<String, ConversionError> {
    let sample = rows
        .first()
        .ok_or_else(|| ExportError::EmptyInput("rows".to_string()))?;
    let (ddl_options, insert_options) = config.relational_options();

    let tables = sql::compile_tables(sample, &ddl_options)?;
    let batches = insert::compile_batches(rows, &insert_options)?;
    debug!(
        tables = tables.flatten().len(),
        batches = batches.flatten().len(),
        rows = rows.len(),
        "Compiled relational output"
    );
    Ok(format!(
        "{}\n\n{}",
        SQLExporter::export_tables(&tables),
        InsertExporter::export_batches(&batches, &insert_options)
    ))
}

fn struct_decl(value: &JsonValue, config: &ConversionConfig) -> Result<String, ConversionError> {
    let codegen = GoStructExporter::with_type_name(config.struct_name.clone());
    Ok(codegen.json_to_struct_decl(value)?.code)
}

/// Run a request and deliver the outcome to `sink`.
pub fn handle_convert<S: ResultSink>(request: &ConvertRequest, sink: &mut S) {
    let result = Converter::new().convert(request);
    if let Err(err) = &result {
        debug!(kind = ?err.kind(), error = %err, "Conversion failed");
    }
    sink.deliver(result);
}

/// Run a request with the native backend.
pub fn convert(request: &ConvertRequest) -> Result<String, ConversionError> {
    Converter::new().convert(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOptions;

    fn seeded() -> ConversionConfig {
        ConversionConfig::builder().seed(11).build()
    }

    fn run(from: DataFormat, to: DataFormat, source: &str, count: usize) -> Result<String, ConversionError> {
        convert(
            &ConvertRequest::new(from, to, source)
                .with_mock_count(count)
                .with_config(seeded()),
        )
    }

    #[test]
    fn test_route_table() {
        use DataFormat::*;
        assert_eq!(Route::resolve(TypeScript, Zod), Some(Route::TypeToSchema));
        assert_eq!(Route::resolve(Zod, Postgres), Some(Route::MockSql));
        assert_eq!(Route::resolve(Json, Go), Some(Route::JsonStruct));
        for to in DataFormat::ALL {
            assert_eq!(Route::resolve(Postgres, to), None);
            assert_eq!(Route::resolve(Go, to), None);
            assert_eq!(Route::resolve(to, to), None);
        }
    }

    #[test]
    fn test_unsupported_pair() {
        let err = run(DataFormat::Postgres, DataFormat::TypeScript, "CREATE TABLE t ();", 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConversion);
        assert_eq!(err.to_string(), "Conversion from pg to ts is not supported");
    }

    #[test]
    fn test_handle_convert_delivers_to_sink() {
        let mut delivered: Vec<Result<String, ConversionError>> = Vec::new();
        let mut sink = |result: Result<String, ConversionError>| delivered.push(result);
        handle_convert(
            &ConvertRequest::new(DataFormat::TypeScript, DataFormat::Zod, "{ a: string }"),
            &mut sink,
        );
        handle_convert(
            &ConvertRequest::new(DataFormat::TypeScript, DataFormat::Zod, "{ a: "),
            &mut sink,
        );
        assert_eq!(delivered.len(), 2);
        assert!(delivered[0].as_ref().unwrap().contains("a: z.string(),"));
        assert_eq!(delivered[1].as_ref().unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_mock_json_counts() {
        let one = run(DataFormat::TypeScript, DataFormat::Json, "{ name: string }", 1).unwrap();
        assert!(JsonValue::parse(&one).unwrap().as_object().is_some());

        let three = run(DataFormat::Zod, DataFormat::Json, "z.object({ n: z.number() })", 3).unwrap();
        assert_eq!(JsonValue::parse(&three).unwrap().as_array().unwrap().len(), 3);

        assert_eq!(run(DataFormat::TypeScript, DataFormat::Json, "{ name: string }", 0).unwrap(), "[]");
    }

    #[test]
    fn test_mock_sql_shares_sample() {
        let output = run(
            DataFormat::Zod,
            DataFormat::Postgres,
            "z.object({ id: z.number().int(), note: z.string(), items: z.array(z.object({ sku: z.string() })) })",
            2,
        )
        .unwrap();
        assert!(output.starts_with("CREATE TABLE generic (\n"));
        assert!(output.contains("CREATE TABLE generic_items (\n  generic_id INTEGER NOT NULL,"));
        assert!(output.contains("INSERT INTO generic (id, note)\nVALUES\n"));
        assert_eq!(output.matches("CREATE TABLE").count(), 2);
    }

    #[test]
    fn test_json_routes() {
        let ts = run(DataFormat::Json, DataFormat::TypeScript, r#"{"a": 1, "b": ["x"]}"#, 1).unwrap();
        assert_eq!(ts, "type Root = {\n  a: number;\n  b: string[];\n};");

        let zod = run(DataFormat::Json, DataFormat::Zod, r#"[{"a": 1}, {"a": 2, "b": true}]"#, 1).unwrap();
        assert_eq!(
            zod,
            "export const rootSchema = z.array(z.object({\n  a: z.number(),\n  b: z.boolean().optional(),\n}));"
        );

        let sql = run(DataFormat::Json, DataFormat::Postgres, r#"[{"id": 1}, {"id": 2}]"#, 1).unwrap();
        assert!(sql.contains("VALUES\n(1),\n(2)\nRETURNING *;"));

        let go = run(DataFormat::Json, DataFormat::Go, r#"{"id": 1}"#, 1).unwrap();
        assert!(go.starts_with("type AutoGenerated struct {"));
    }

    #[test]
    fn test_error_kinds() {
        let parse = run(DataFormat::Json, DataFormat::Postgres, "{not json", 1).unwrap_err();
        assert_eq!(parse.kind(), ErrorKind::Parse);

        let empty = run(DataFormat::Json, DataFormat::Postgres, "[]", 1).unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::EmptyInput);

        let config = ConversionConfig::builder().max_depth(2).build();
        let deep = convert(
            &ConvertRequest::new(DataFormat::Json, DataFormat::TypeScript, r#"{"a": {"b": {"c": {"d": 1}}}}"#)
                .with_config(config),
        )
        .unwrap_err();
        assert_eq!(deep.kind(), ErrorKind::DepthLimit);
    }

    #[test]
    fn test_blank_source_is_a_parse_error() {
        let err = run(DataFormat::Json, DataFormat::TypeScript, "  \n", 1).unwrap_err();
        assert!(matches!(err, ConversionError::Import(ImportError::Empty(_))));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_reference_cycle_fails_cleanly() {
        let err = run(DataFormat::TypeScript, DataFormat::Json, "type A = B; type B = A;", 1).unwrap_err();
        assert!(matches!(err, ConversionError::Export(ExportError::CyclicReference(_))));
        assert_eq!(err.kind(), ErrorKind::DepthLimit);
    }

    #[test]
    fn test_array_root_schema_to_sql() {
        for (from, source) in [
            (DataFormat::Zod, "z.array(z.object({ a: z.string() }))"),
            (DataFormat::TypeScript, "{ a: string }[]"),
        ] {
            let output = run(from, DataFormat::Postgres, source, 2).unwrap();
            assert!(output.starts_with("CREATE TABLE generic (\n"));
            assert!(output.contains("  a TEXT"));
            assert!(output.contains("INSERT INTO generic ("));
            assert_eq!(output.matches("CREATE TABLE").count(), 1);
        }
    }

    #[test]
    fn test_ddl_table_name_drives_inserts() {
        let config = ConversionConfig::from_toml_str("[ddl]\ntableName = \"orders\"\n").unwrap();
        let output = convert(
            &ConvertRequest::new(DataFormat::Json, DataFormat::Postgres, r#"[{"id": 1, "v": "x"}]"#)
                .with_config(config),
        )
        .unwrap();
        assert!(output.starts_with("CREATE TABLE orders (\n"));
        assert!(output.contains("INSERT INTO orders (id, v)\n"));
        assert!(!output.contains("generic"));
    }

    #[test]
    fn test_custom_backend() {
        struct Fixed;
        impl SchemaBackend for Fixed {
            fn parse_type_definition(&self, _: &str) -> Result<SchemaDocument, ImportError> {
                Ok(SchemaDocument::single("Fixed", crate::models::SchemaNode::Boolean))
            }
            fn parse_schema_notation(&self, text: &str) -> Result<SchemaDocument, ImportError> {
                self.parse_type_definition(text)
            }
            fn type_definition_text(&self, doc: &SchemaDocument) -> String {
                doc.declarations[0].name.clone()
            }
            fn schema_notation_text(&self, _: &SchemaDocument) -> String {
                "fixed".to_string()
            }
            fn generate_conforming_values(
                &self,
                _: &SchemaDocument,
                count: usize,
                _: &MockOptions,
            ) -> Result<Vec<JsonValue>, ExportError> {
                Ok(vec![JsonValue::Bool(true); count])
            }
        }

        let converter = Converter::with_backend(Fixed);
        let request = ConvertRequest::new(DataFormat::TypeScript, DataFormat::Zod, "anything");
        assert_eq!(converter.convert(&request).unwrap(), "fixed");
        let request = ConvertRequest::new(DataFormat::TypeScript, DataFormat::Json, "x").with_mock_count(2);
        assert_eq!(converter.convert(&request).unwrap(), "[\n  true,\n  true\n]");
    }
}
