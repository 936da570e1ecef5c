//! Mock data generation
//!
//! Produces JSON instances that conform to a [`SchemaDocument`](crate::models::SchemaDocument).
//! The generated instances feed the JSON, SQL and struct targets of the
//! converter.

mod faker;
mod generator;

pub use generator::{MockGenerator, MockOptions, generate_mocks};
