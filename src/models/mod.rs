//! Models module for the SDK
//!
//! Defines the structures that flow between importers, exporters and the
//! conversion dispatcher: the canonical schema, JSON values and the derived
//! relational tables.

pub mod enums;
pub mod schema;
pub mod table;
pub mod value;

pub use enums::*;
pub use schema::{
    Declaration, Field, Literal, NumberChecks, SchemaDocument, SchemaNode, StringChecks,
    StringFormat,
};
pub use table::{ColumnSpec, InsertBatch, KeySource, ParentLink, TableSpec};
pub use value::{JsonObject, JsonValue, format_timestamp};
