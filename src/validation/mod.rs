//! Validation functionality
//!
//! Provides identifier normalization shared by the relational compilers.

pub mod identifiers;

pub use identifiers::{is_id_like, is_normalized, normalize_identifier, normalize_identifier_or};
