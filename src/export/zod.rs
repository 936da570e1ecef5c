//! Zod schema exporter
//!
//! Prints one `export const <name>Schema = ...;` per declaration, ordered so
//! that every schema is defined before it is used. References that cannot be
//! satisfied by that order (recursion) are wrapped in `z.lazy`.

use super::typescript::{format_number, property_name, quote_string};
use crate::export::{ExportError, ExportResult};
use crate::models::{Field, Literal, SchemaDocument, SchemaNode, StringFormat};
use std::collections::BTreeSet;

const INDENT: &str = "  ";

/// `User` -> `userSchema`
pub fn schema_variable(declaration: &str) -> String {
    let mut chars = declaration.chars();
    match chars.next() {
        Some(first) => format!("{}{}Schema", first.to_lowercase(), chars.as_str()),
        None => "schema".to_string(),
    }
}

/// Exporter for Zod schemas.
#[derive(Debug, Clone, Default)]
pub struct ZodExporter {
    /// Start the output with `import { z } from "zod";`
    pub include_import: bool,
}

impl ZodExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_import(mut self, enabled: bool) -> Self {
        self.include_import = enabled;
        self
    }

    /// Print every declaration in dependency order.
    pub fn export_document(&self, doc: &SchemaDocument) -> String {
        let mut defined: BTreeSet<String> = BTreeSet::new();
        let mut blocks: Vec<String> = Vec::new();
        if self.include_import {
            blocks.push("import { z } from \"zod\";".to_string());
        }
        for declaration in doc.dependency_order() {
            let printer = Printer { defined: &defined };
            let mut block = String::new();
            if let Some(description) = &declaration.description {
                block.push_str(&format!("/** {} */\n", description.replace("*/", "*\\/")));
            }
            block.push_str(&format!(
                "export const {} = {};",
                schema_variable(&declaration.name),
                printer.print(&declaration.node, 0)
            ));
            blocks.push(block);
            defined.insert(declaration.name.clone());
        }
        blocks.join("\n\n")
    }

    /// Export a document (SDK interface).
    pub fn export(&self, doc: &SchemaDocument) -> Result<ExportResult, ExportError> {
        Ok(ExportResult {
            content: self.export_document(doc),
            format: "zod".to_string(),
        })
    }
}

struct Printer<'a> {
    /// Declarations already emitted
    defined: &'a BTreeSet<String>,
}

impl Printer<'_> {
    fn print(&self, node: &SchemaNode, depth: usize) -> String {
        match node {
            SchemaNode::String(checks) => {
                let mut out = "z.string()".to_string();
                match checks.format {
                    Some(StringFormat::Email) => out.push_str(".email()"),
                    Some(StringFormat::Uuid) => out.push_str(".uuid()"),
                    Some(StringFormat::Url) => out.push_str(".url()"),
                    Some(StringFormat::Datetime) => out.push_str(".datetime()"),
                    None => {}
                }
                if let Some(min) = checks.min_length {
                    out.push_str(&format!(".min({min})"));
                }
                if let Some(max) = checks.max_length {
                    out.push_str(&format!(".max({max})"));
                }
                out
            }
            SchemaNode::Number(checks) => {
                let mut out = "z.number()".to_string();
                if checks.integer {
                    out.push_str(".int()");
                }
                if let Some(min) = checks.min {
                    out.push_str(&format!(".min({})", format_number(min)));
                }
                if let Some(max) = checks.max {
                    out.push_str(&format!(".max({})", format_number(max)));
                }
                out
            }
            SchemaNode::BigInt => "z.bigint()".to_string(),
            SchemaNode::Boolean => "z.boolean()".to_string(),
            SchemaNode::Date => "z.date()".to_string(),
            SchemaNode::Null => "z.null()".to_string(),
            SchemaNode::Undefined => "z.undefined()".to_string(),
            SchemaNode::Any => "z.any()".to_string(),
            SchemaNode::Unknown => "z.unknown()".to_string(),
            SchemaNode::Never => "z.never()".to_string(),
            SchemaNode::Literal { value } => {
                let printed = match value {
                    Literal::String(s) => quote_string(s),
                    Literal::Number(n) => format_number(*n),
                    Literal::Bool(b) => b.to_string(),
                };
                format!("z.literal({printed})")
            }
            SchemaNode::Enum { values } => format!(
                "z.enum([{}])",
                values
                    .iter()
                    .map(|v| quote_string(v))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            SchemaNode::Object { fields } => self.print_object(fields, depth),
            SchemaNode::Array { items } => format!("z.array({})", self.print(items, depth)),
            SchemaNode::Tuple { items } => format!("z.tuple([{}])", self.print_list(items, depth)),
            SchemaNode::Record { key, value } => format!(
                "z.record({}, {})",
                self.print(key, depth),
                self.print(value, depth)
            ),
            SchemaNode::Union { options } => {
                format!("z.union([{}])", self.print_list(options, depth))
            }
            SchemaNode::Intersection { parts } => {
                let mut printed = parts.iter().map(|part| self.print(part, depth));
                let first = printed.next().unwrap_or_else(|| "z.unknown()".to_string());
                printed.fold(first, |acc, next| format!("{acc}.and({next})"))
            }
            SchemaNode::Optional { inner } => format!("{}.optional()", self.print(inner, depth)),
            SchemaNode::Nullable { inner } => format!("{}.nullable()", self.print(inner, depth)),
            SchemaNode::Ref { name } => {
                let variable = schema_variable(name);
                if self.defined.contains(name) {
                    variable
                } else {
                    format!("z.lazy(() => {variable})")
                }
            }
        }
    }

    fn print_list(&self, nodes: &[SchemaNode], depth: usize) -> String {
        nodes
            .iter()
            .map(|node| self.print(node, depth))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn print_object(&self, fields: &[Field], depth: usize) -> String {
        if fields.is_empty() {
            return "z.object({})".to_string();
        }
        let indent = INDENT.repeat(depth + 1);
        let mut out = String::from("z.object({\n");
        for field in fields {
            if let Some(description) = &field.description {
                out.push_str(&format!(
                    "{indent}/** {} */\n",
                    description.replace("*/", "*\\/")
                ));
            }
            out.push_str(&format!(
                "{indent}{}: {},\n",
                property_name(&field.name),
                self.print(&field.node, depth + 1)
            ));
        }
        out.push_str(&INDENT.repeat(depth));
        out.push_str("})");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{TypeScriptImporter, ZodImporter};
    use crate::models::{NumberChecks, StringChecks};

    #[test]
    fn test_schema_variable() {
        assert_eq!(schema_variable("User"), "userSchema");
        assert_eq!(schema_variable("Random"), "randomSchema");
        assert_eq!(schema_variable("HTTPThing"), "hTTPThingSchema");
    }

    #[test]
    fn test_print_object() {
        let doc = SchemaDocument::single(
            "User",
            SchemaNode::object(vec![
                Field::new(
                    "email",
                    SchemaNode::String(StringChecks {
                        format: Some(StringFormat::Email),
                        ..Default::default()
                    }),
                ),
                Field::new(
                    "age",
                    SchemaNode::Number(NumberChecks {
                        integer: true,
                        min: Some(0.0),
                        max: None,
                    })
                    .optional(),
                ),
                Field::new("role", SchemaNode::Enum { values: vec!["a".into(), "b".into()] }),
                Field::new("tags", SchemaNode::array(SchemaNode::string()).nullable()),
            ]),
        );
        assert_eq!(
            ZodExporter::new().export_document(&doc),
            "export const userSchema = z.object({\n\
             \x20 email: z.string().email(),\n\
             \x20 age: z.number().int().min(0).optional(),\n\
             \x20 role: z.enum([\"a\", \"b\"]),\n\
             \x20 tags: z.array(z.string()).nullable(),\n\
             });"
        );
    }

    #[test]
    fn test_dependency_order_and_lazy() {
        let doc = TypeScriptImporter::new()
            .parse(
                r#"
                type User = { address: Address; friends: User[] };
                type Address = { city: string };
                "#,
            )
            .unwrap();
        let printed = ZodExporter::new().with_import(true).export_document(&doc);
        let address = printed.find("export const addressSchema").unwrap();
        let user = printed.find("export const userSchema").unwrap();
        assert!(printed.starts_with("import { z } from \"zod\";"));
        assert!(address < user);
        assert!(printed.contains("  address: addressSchema,\n"));
        assert!(printed.contains("  friends: z.array(z.lazy(() => userSchema)),\n"));
    }

    #[test]
    fn test_round_trip_through_zod() {
        let source = r#"
            /** A product */
            interface Product {
                /** Stock keeping unit */
                sku: string;
                price: number;
                tags?: string[];
                kind: "physical" | "digital";
                dims: [number, number] | null;
                extra: Record<string, boolean>;
            }
        "#;
        let doc = TypeScriptImporter::new().parse(source).unwrap();
        let zod = ZodExporter::new().export_document(&doc);
        let back = ZodImporter::new().parse(&zod).unwrap();
        assert_eq!(doc, back);
    }
}
