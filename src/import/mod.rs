//! Import functionality
//!
//! Provides parsers that read text into the canonical models:
//! - TypeScript type definitions -> [`SchemaDocument`](crate::models::SchemaDocument)
//! - Zod validation schemas -> [`SchemaDocument`](crate::models::SchemaDocument)
//! - JSON text -> [`JsonValue`](crate::models::JsonValue)

pub mod json;
pub mod lexer;
pub mod typescript;
pub mod zod;

use crate::models::SchemaDocument;

/// Error during import
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Unknown reference: {0}")]
    UnresolvedReference(String),
    #[error("No declarations found in {0} input")]
    Empty(&'static str),
    #[error("Maximum nesting depth exceeded: {depth} > {max}")]
    MaxDepthExceeded { depth: usize, max: usize },
}

impl ImportError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        ImportError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InvalidJson(err.to_string())
    }
}

/// Fail on the first reference that names no declaration in the document.
pub(crate) fn check_references(doc: &SchemaDocument) -> Result<(), ImportError> {
    for declaration in &doc.declarations {
        for name in declaration.node.references() {
            if doc.get(&name).is_none() {
                return Err(ImportError::UnresolvedReference(name));
            }
        }
    }
    Ok(())
}

pub use json::parse_json;
pub use typescript::TypeScriptImporter;
pub use zod::ZodImporter;
