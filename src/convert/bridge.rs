//! Canonical schema bridge
//!
//! Defines the SchemaBackend trait, the capability set the dispatcher relies
//! on for type-definition text, schema-notation text and conforming values,
//! plus the native implementation built on the crate's own parsers, printers
//! and mock generator.

use super::ConversionError;
use crate::export::{ExportError, TypeScriptExporter, ZodExporter};
use crate::import::{ImportError, TypeScriptImporter, ZodImporter};
use crate::mock::{MockGenerator, MockOptions};
use crate::models::{JsonValue, SchemaDocument};

/// Trait for schema backends
pub trait SchemaBackend {
    /// Parse type-definition text into a canonical schema
    fn parse_type_definition(&self, text: &str) -> Result<SchemaDocument, ImportError>;

    /// Parse schema-notation text into a canonical schema
    fn parse_schema_notation(&self, text: &str) -> Result<SchemaDocument, ImportError>;

    /// Print a canonical schema as type-definition text
    fn type_definition_text(&self, doc: &SchemaDocument) -> String;

    /// Print a canonical schema as schema-notation text
    fn schema_notation_text(&self, doc: &SchemaDocument) -> String;

    /// Generate `count` values conforming to the root declaration
    fn generate_conforming_values(
        &self,
        doc: &SchemaDocument,
        count: usize,
        options: &MockOptions,
    ) -> Result<Vec<JsonValue>, ExportError>;
}

/// Backend using the built-in TypeScript/Zod parsers and the mock generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl SchemaBackend for NativeBackend {
    fn parse_type_definition(&self, text: &str) -> Result<SchemaDocument, ImportError> {
        TypeScriptImporter::new().parse(text)
    }

    fn parse_schema_notation(&self, text: &str) -> Result<SchemaDocument, ImportError> {
        ZodImporter::new().parse(text)
    }

    fn type_definition_text(&self, doc: &SchemaDocument) -> String {
        TypeScriptExporter::new().export_document(doc)
    }

    fn schema_notation_text(&self, doc: &SchemaDocument) -> String {
        ZodExporter::new().export_document(doc)
    }

    fn generate_conforming_values(
        &self,
        doc: &SchemaDocument,
        count: usize,
        options: &MockOptions,
    ) -> Result<Vec<JsonValue>, ExportError> {
        MockGenerator::new(doc, options.clone()).generate_many(count)
    }
}

/// TypeScript text -> Zod text
pub fn type_text_to_schema(text: &str) -> Result<String, ConversionError> {
    let backend = NativeBackend;
    let doc = backend.parse_type_definition(text)?;
    Ok(backend.schema_notation_text(&doc))
}

/// Zod text -> TypeScript text
pub fn schema_to_type_text(text: &str) -> Result<String, ConversionError> {
    let backend = NativeBackend;
    let doc = backend.parse_schema_notation(text)?;
    Ok(backend.type_definition_text(&doc))
}

/// Pretty JSON for `count` conforming instances: one object for a count of
/// one, otherwise an array of exactly `count` elements.
pub fn generate_mocks(
    doc: &SchemaDocument,
    count: usize,
    options: &MockOptions,
) -> Result<String, ConversionError> {
    Ok(crate::mock::generate_mocks(doc, count, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_text_to_schema() {
        let zod = type_text_to_schema("{ name: string; age?: number }").unwrap();
        assert_eq!(
            zod,
            "export const randomSchema = z.object({\n  name: z.string(),\n  age: z.number().optional(),\n});"
        );
    }

    #[test]
    fn test_schema_to_type_text() {
        let ts = schema_to_type_text("z.object({ id: z.string().uuid(), tags: z.array(z.string()) })")
            .unwrap();
        assert_eq!(ts, "type Schema = {\n  id: string;\n  tags: string[];\n};");
    }

    #[test]
    fn test_parse_errors_surface() {
        assert!(matches!(
            type_text_to_schema("{ name: string"),
            Err(ConversionError::Import(ImportError::Syntax { .. }))
        ));
        assert!(matches!(
            schema_to_type_text("z.object({ name: z.frobnicate() })"),
            Err(ConversionError::Import(_))
        ));
    }

    #[test]
    fn test_generate_mocks_counts() {
        let doc = NativeBackend.parse_type_definition("{ name: string }").unwrap();
        let options = MockOptions::new().with_seed(9);

        let one = JsonValue::parse(&generate_mocks(&doc, 1, &options).unwrap()).unwrap();
        assert!(one.as_object().is_some());

        let many = JsonValue::parse(&generate_mocks(&doc, 3, &options).unwrap()).unwrap();
        assert_eq!(many.as_array().map(<[JsonValue]>::len), Some(3));
    }
}
