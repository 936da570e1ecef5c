//! Export functionality
//!
//! Provides exporters for various formats:
//! - PostgreSQL DDL (`CREATE TABLE`) from a JSON sample
//! - PostgreSQL DML (`INSERT`) from JSON rows
//! - TypeScript type definitions
//! - Zod schemas
//! - Go struct declarations

pub mod go;
pub mod insert;
pub mod sql;
pub mod typescript;
pub mod zod;

/// Result of an export operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    /// Exported content
    pub content: String,
    /// Format identifier
    pub format: String,
}

/// Error during export
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to export: {0} is empty")]
    EmptyInput(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Nesting depth {depth} exceeds the limit of {max}")]
    DepthLimitExceeded { depth: usize, max: usize },
    #[error("Unknown reference: {0}")]
    UnresolvedReference(String),
    #[error("Reference `{0}` only leads back to itself")]
    CyclicReference(String),
    #[error("Expected a JSON {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

pub use go::{GoStructExporter, StructCodegen, StructDecl};
pub use insert::{ConflictAction, InsertExporter, InsertOptions, Returning};
pub use sql::{DdlOptions, SQLExporter};
pub use typescript::TypeScriptExporter;
pub use zod::ZodExporter;
