//! TypeScript type definition exporter
//!
//! Prints a [`SchemaDocument`] as `type Name = ...;` declarations. Optional
//! members print as `name?: T | undefined`, which the importer folds back to
//! an optional node.

use crate::export::{ExportError, ExportResult};
use crate::models::{Field, Literal, SchemaDocument, SchemaNode};

const INDENT: &str = "  ";

/// Exporter for TypeScript type definitions.
#[derive(Debug, Clone, Default)]
pub struct TypeScriptExporter {
    /// Prefix every declaration with `export`
    pub export_keyword: bool,
}

impl TypeScriptExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export_keyword(mut self, enabled: bool) -> Self {
        self.export_keyword = enabled;
        self
    }

    /// Print every declaration, in document order, separated by blank lines.
    pub fn export_document(&self, doc: &SchemaDocument) -> String {
        doc.declarations
            .iter()
            .map(|declaration| {
                let mut out = String::new();
                if let Some(description) = &declaration.description {
                    out.push_str(&doc_comment(description, 0));
                }
                if self.export_keyword {
                    out.push_str("export ");
                }
                out.push_str(&format!(
                    "type {} = {};",
                    declaration.name,
                    print_node(&declaration.node, 0)
                ));
                out
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Export a document (SDK interface).
    pub fn export(&self, doc: &SchemaDocument) -> Result<ExportResult, ExportError> {
        Ok(ExportResult {
            content: self.export_document(doc),
            format: "typescript".to_string(),
        })
    }
}

/// Print a single node as a TypeScript type expression.
pub fn print_node(node: &SchemaNode, depth: usize) -> String {
    match node {
        SchemaNode::String(_) => "string".to_string(),
        SchemaNode::Number(_) => "number".to_string(),
        SchemaNode::BigInt => "bigint".to_string(),
        SchemaNode::Boolean => "boolean".to_string(),
        SchemaNode::Date => "Date".to_string(),
        SchemaNode::Null => "null".to_string(),
        SchemaNode::Undefined => "undefined".to_string(),
        SchemaNode::Any => "any".to_string(),
        SchemaNode::Unknown => "unknown".to_string(),
        SchemaNode::Never => "never".to_string(),
        SchemaNode::Literal { value } => print_literal(value),
        SchemaNode::Enum { values } => values
            .iter()
            .map(|v| quote_string(v))
            .collect::<Vec<_>>()
            .join(" | "),
        SchemaNode::Object { fields } => print_object(fields, depth),
        SchemaNode::Array { items } => {
            let inner = print_node(items, depth);
            if needs_parens(items) {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            }
        }
        SchemaNode::Tuple { items } => format!(
            "[{}]",
            items
                .iter()
                .map(|item| print_node(item, depth))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        SchemaNode::Record { key, value } => format!(
            "Record<{}, {}>",
            print_node(key, depth),
            print_node(value, depth)
        ),
        SchemaNode::Union { options } => options
            .iter()
            .map(|option| print_node(option, depth))
            .collect::<Vec<_>>()
            .join(" | "),
        SchemaNode::Intersection { parts } => parts
            .iter()
            .map(|part| {
                let printed = print_node(part, depth);
                if needs_parens(part) {
                    format!("({printed})")
                } else {
                    printed
                }
            })
            .collect::<Vec<_>>()
            .join(" & "),
        SchemaNode::Optional { inner } => format!("{} | undefined", print_node(inner, depth)),
        SchemaNode::Nullable { inner } => format!("{} | null", print_node(inner, depth)),
        SchemaNode::Ref { name } => name.clone(),
    }
}

fn needs_parens(node: &SchemaNode) -> bool {
    match node {
        SchemaNode::Union { .. } | SchemaNode::Optional { .. } | SchemaNode::Nullable { .. } => true,
        SchemaNode::Enum { values } => values.len() > 1,
        _ => false,
    }
}

fn print_object(fields: &[Field], depth: usize) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let indent = INDENT.repeat(depth + 1);
    let mut out = String::from("{\n");
    for field in fields {
        if let Some(description) = &field.description {
            out.push_str(&doc_comment(description, depth + 1));
        }
        let name = property_name(&field.name);
        match &field.node {
            SchemaNode::Optional { inner } => out.push_str(&format!(
                "{indent}{name}?: {} | undefined;\n",
                print_node(inner, depth + 1)
            )),
            node => out.push_str(&format!("{indent}{name}: {};\n", print_node(node, depth + 1))),
        }
    }
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
    out
}

fn doc_comment(text: &str, depth: usize) -> String {
    format!("{}/** {} */\n", INDENT.repeat(depth), text.replace("*/", "*\\/"))
}

fn print_literal(value: &Literal) -> String {
    match value {
        Literal::String(s) => quote_string(s),
        Literal::Number(n) => format_number(*n),
        Literal::Bool(b) => b.to_string(),
    }
}

/// Integral values print without a fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub(crate) fn quote_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Member names that are not identifiers are quoted.
pub(crate) fn property_name(name: &str) -> String {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_string()
    } else {
        quote_string(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::TypeScriptImporter;
    use crate::models::Declaration;

    #[test]
    fn test_print_object() {
        let doc = SchemaDocument::single(
            "User",
            SchemaNode::object(vec![
                Field::new("name", SchemaNode::string()).with_description("Full name"),
                Field::new("age", SchemaNode::number().optional()),
                Field::new("first-name", SchemaNode::string().nullable()),
                Field::new(
                    "tags",
                    SchemaNode::array(SchemaNode::union(vec![SchemaNode::string(), SchemaNode::number()])),
                ),
                Field::new(
                    "address",
                    SchemaNode::object(vec![Field::new("city", SchemaNode::string())]),
                ),
            ]),
        );
        assert_eq!(
            TypeScriptExporter::new().export_document(&doc),
            "type User = {\n\
             \x20 /** Full name */\n\
             \x20 name: string;\n\
             \x20 age?: number | undefined;\n\
             \x20 \"first-name\": string | null;\n\
             \x20 tags: (string | number)[];\n\
             \x20 address: {\n\
             \x20   city: string;\n\
             \x20 };\n\
             };"
        );
    }

    #[test]
    fn test_literals_and_exports() {
        let mut doc = SchemaDocument::new();
        doc.add(Declaration::new(
            "Status",
            SchemaNode::Enum {
                values: vec!["on".into(), "off".into()],
            },
        ));
        doc.add(Declaration::new(
            "Pair",
            SchemaNode::Tuple {
                items: vec![
                    SchemaNode::Literal {
                        value: Literal::Number(1.0),
                    },
                    SchemaNode::Literal {
                        value: Literal::Number(2.5),
                    },
                ],
            },
        ));
        let printed = TypeScriptExporter::new()
            .with_export_keyword(true)
            .export_document(&doc);
        assert_eq!(
            printed,
            "export type Status = \"on\" | \"off\";\n\nexport type Pair = [1, 2.5];"
        );
    }

    #[test]
    fn test_round_trip() {
        let source = r#"
            type Item = { sku: string; qty: number };
            type Order = {
                id: string;
                items: Item[];
                note?: string;
                meta: Record<string, unknown>;
                kind: "a" | "b" | null;
            };
        "#;
        let doc = TypeScriptImporter::new().parse(source).unwrap();
        let printed = TypeScriptExporter::new().export_document(&doc);
        let reparsed = TypeScriptImporter::new().parse(&printed).unwrap();
        assert_eq!(doc, reparsed);
    }
}
