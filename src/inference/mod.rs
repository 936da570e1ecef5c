//! Schema inference for JSON samples
//!
//! Derives a canonical [`SchemaDocument`](crate::models::SchemaDocument) from
//! one or more JSON values, so JSON input can be printed as TypeScript types
//! or Zod schemas.
//!
//! ## Features
//!
//! - **Type inference** - strings, integers, numbers, booleans, dates, arrays, objects
//! - **Format detection** - email, uuid, url and ISO-8601 date-time strings
//! - **Merging** - array elements and repeated records merge into one shape;
//!   fields missing from some records become optional
//!
//! ## Example
//!
//! ```rust
//! use data_conversion_sdk::inference::{InferenceConfig, SchemaInferrer};
//! use data_conversion_sdk::models::JsonValue;
//!
//! let mut inferrer = SchemaInferrer::with_config(InferenceConfig::default());
//! inferrer.add_value(&JsonValue::parse(r#"{"name": "Alice", "age": 30}"#).unwrap()).unwrap();
//! inferrer.add_value(&JsonValue::parse(r#"{"name": "Bob"}"#).unwrap()).unwrap();
//!
//! let doc = inferrer.finalize().unwrap();
//! assert_eq!(doc.declarations[0].name, "Root");
//! ```

mod config;
mod error;
mod formats;
mod inferrer;
mod types;

pub use config::{InferenceConfig, InferenceConfigBuilder};
pub use error::InferenceError;
pub use formats::detect_format;
pub use inferrer::{InferenceStats, SchemaInferrer, infer_schema};
pub use types::{InferredField, InferredType};
