//! Data Conversion SDK - Transcoding between data shape notations
//!
//! Provides unified interfaces for:
//! - TypeScript type definitions and Zod schemas (import/export)
//! - JSON schema inference and mock data generation
//! - PostgreSQL DDL and DML generation from JSON samples
//! - Go struct generation from JSON samples
//! - A conversion dispatcher routing between all of the above

pub mod config;
pub mod convert;
pub mod export;
pub mod import;
pub mod inference;
pub mod mock;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigError, ConversionConfig, ConversionConfigBuilder};
pub use convert::{
    ConversionError, ConvertRequest, Converter, ErrorKind, ResultSink, Route, convert,
    handle_convert,
};
pub use export::{
    ConflictAction, DdlOptions, ExportError, ExportResult, GoStructExporter, InsertExporter,
    InsertOptions, Returning, SQLExporter, StructCodegen, TypeScriptExporter, ZodExporter,
};
pub use import::{ImportError, TypeScriptImporter, ZodImporter};
pub use inference::{InferenceConfig, InferenceError, SchemaInferrer};
pub use mock::{MockGenerator, MockOptions};

// Re-export models
pub use models::enums::*;
pub use models::{JsonValue, SchemaDocument, SchemaNode, TableSpec};
