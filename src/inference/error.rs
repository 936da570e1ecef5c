//! Error types for schema inference

use thiserror::Error;

/// Errors that can occur during schema inference
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Maximum depth exceeded
    #[error("Maximum nesting depth exceeded: {depth} > {max}")]
    MaxDepthExceeded { depth: usize, max: usize },

    /// No records to infer from
    #[error("No records provided for inference")]
    NoRecords,
}
