//! Type definitions for schema inference

use crate::models::{Field, NumberChecks, SchemaNode, StringChecks, StringFormat};

/// Inferred type for a JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum InferredType {
    /// Null value
    Null,
    /// Boolean value
    Boolean,
    /// Integer value
    Integer,
    /// Floating point number
    Number,
    /// String with optional detected format
    String { format: Option<StringFormat> },
    /// Native date value
    Date,
    /// Array with inferred item type; `nullable` when some elements are null
    Array {
        items: Box<InferredType>,
        nullable: bool,
    },
    /// Object with fields in first-seen order
    Object { fields: Vec<InferredField> },
    /// Mixed types (union)
    Mixed { types: Vec<InferredType> },
    /// Unknown type (e.g. the items of an empty array)
    Unknown,
}

impl InferredType {
    /// Get a simple type name for display
    pub fn type_name(&self) -> &'static str {
        match self {
            InferredType::Null => "null",
            InferredType::Boolean => "boolean",
            InferredType::Integer => "integer",
            InferredType::Number => "number",
            InferredType::String { .. } => "string",
            InferredType::Date => "date",
            InferredType::Array { .. } => "array",
            InferredType::Object { .. } => "object",
            InferredType::Mixed { .. } => "mixed",
            InferredType::Unknown => "unknown",
        }
    }

    /// Two types merge into one member of a union instead of sitting side by side
    fn is_compatible(&self, other: &InferredType) -> bool {
        matches!(
            (self, other),
            (
                InferredType::Integer | InferredType::Number,
                InferredType::Integer | InferredType::Number
            )
        ) || self.type_name() == other.type_name()
    }

    /// Merge two inferred types
    pub fn merge_with(&self, other: &InferredType) -> InferredType {
        match (self, other) {
            (a, b) if a == b => a.clone(),

            // Null and Unknown yield to the other side; nullability is tracked by the holder
            (InferredType::Null, t) | (t, InferredType::Null) => t.clone(),
            (InferredType::Unknown, t) | (t, InferredType::Unknown) => t.clone(),

            (InferredType::Integer, InferredType::Number)
            | (InferredType::Number, InferredType::Integer) => InferredType::Number,

            (InferredType::String { format: f1 }, InferredType::String { format: f2 }) => {
                InferredType::String {
                    format: if f1 == f2 { *f1 } else { None },
                }
            }

            (
                InferredType::Array {
                    items: i1,
                    nullable: n1,
                },
                InferredType::Array {
                    items: i2,
                    nullable: n2,
                },
            ) => InferredType::Array {
                items: Box::new(i1.merge_with(i2)),
                nullable: *n1 || *n2,
            },

            (InferredType::Object { fields: f1 }, InferredType::Object { fields: f2 }) => {
                InferredType::Object {
                    fields: merge_fields(f1, f2),
                }
            }

            (InferredType::Mixed { types }, other) | (other, InferredType::Mixed { types }) => {
                let mut merged = types.clone();
                let others = match other {
                    InferredType::Mixed { types } => types.clone(),
                    t => vec![t.clone()],
                };
                for t in others {
                    add_to_union(&mut merged, t);
                }
                InferredType::Mixed { types: merged }
            }

            (a, b) => InferredType::Mixed {
                types: vec![a.clone(), b.clone()],
            },
        }
    }

    /// Convert to a schema node
    pub fn to_node(&self, integer_checks: bool) -> SchemaNode {
        match self {
            InferredType::Null => SchemaNode::Null,
            InferredType::Boolean => SchemaNode::Boolean,
            InferredType::Integer if integer_checks => SchemaNode::integer(),
            InferredType::Integer | InferredType::Number => SchemaNode::Number(NumberChecks::default()),
            InferredType::String { format } => SchemaNode::String(StringChecks {
                format: *format,
                ..Default::default()
            }),
            InferredType::Date => SchemaNode::Date,
            InferredType::Array { items, nullable } => {
                let mut node = items.to_node(integer_checks);
                if *nullable && !matches!(**items, InferredType::Null) {
                    node = node.nullable();
                }
                SchemaNode::array(node)
            }
            InferredType::Object { fields } => SchemaNode::object(
                fields
                    .iter()
                    .map(|field| Field::new(field.name.clone(), field.to_node(integer_checks)))
                    .collect(),
            ),
            InferredType::Mixed { types } => {
                SchemaNode::union(types.iter().map(|t| t.to_node(integer_checks)).collect())
            }
            InferredType::Unknown => SchemaNode::Unknown,
        }
    }
}

fn add_to_union(types: &mut Vec<InferredType>, t: InferredType) {
    match types.iter_mut().find(|existing| existing.is_compatible(&t)) {
        Some(existing) => *existing = existing.merge_with(&t),
        None => types.push(t),
    }
}

/// Fields present on only one side become optional
fn merge_fields(left: &[InferredField], right: &[InferredField]) -> Vec<InferredField> {
    let mut merged: Vec<InferredField> = left
        .iter()
        .map(|field| match right.iter().find(|r| r.name == field.name) {
            Some(other) => field.merge_with(other),
            None => InferredField {
                required: false,
                ..field.clone()
            },
        })
        .collect();

    for field in right {
        if !left.iter().any(|l| l.name == field.name) {
            merged.push(InferredField {
                required: false,
                ..field.clone()
            });
        }
    }
    merged
}

/// Inferred field information
#[derive(Debug, Clone, PartialEq)]
pub struct InferredField {
    /// Field name
    pub name: String,
    /// Inferred type
    pub field_type: InferredType,
    /// Whether field appears in all records
    pub required: bool,
    /// Whether field can be null
    pub nullable: bool,
    /// Number of times field was seen
    pub occurrences: usize,
}

impl InferredField {
    /// Create a new inferred field from a single observation
    pub fn new(name: impl Into<String>, field_type: InferredType) -> Self {
        let nullable = matches!(field_type, InferredType::Null);
        Self {
            name: name.into(),
            field_type,
            required: true,
            nullable,
            occurrences: 1,
        }
    }

    /// Merge with another observation of the same field
    pub fn merge_with(&self, other: &InferredField) -> InferredField {
        InferredField {
            name: self.name.clone(),
            field_type: self.field_type.merge_with(&other.field_type),
            required: self.required && other.required,
            nullable: self.nullable || other.nullable,
            occurrences: self.occurrences + other.occurrences,
        }
    }

    /// Schema node with nullable and optional wrappers applied
    pub fn to_node(&self, integer_checks: bool) -> SchemaNode {
        let mut node = self.field_type.to_node(integer_checks);
        if self.nullable && !matches!(self.field_type, InferredType::Null) {
            node = node.nullable();
        }
        if !self.required {
            node = node.optional();
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_same_types() {
        let t = InferredType::Integer;
        assert_eq!(t.merge_with(&InferredType::Integer), InferredType::Integer);
    }

    #[test]
    fn test_merge_integer_number() {
        let merged = InferredType::Integer.merge_with(&InferredType::Number);
        assert_eq!(merged, InferredType::Number);
    }

    #[test]
    fn test_merge_null_with_type() {
        let merged = InferredType::Null.merge_with(&InferredType::Boolean);
        assert_eq!(merged, InferredType::Boolean);
    }

    #[test]
    fn test_merge_different_types() {
        let merged = InferredType::Boolean.merge_with(&InferredType::String { format: None });
        assert!(matches!(merged, InferredType::Mixed { ref types } if types.len() == 2));

        let widened = merged.merge_with(&InferredType::Integer).merge_with(&InferredType::Number);
        match widened {
            InferredType::Mixed { types } => {
                assert_eq!(types.len(), 3);
                assert!(types.contains(&InferredType::Number));
            }
            other => panic!("expected mixed, got {other:?}"),
        }
    }

    #[test]
    fn test_string_formats_merge() {
        let email = InferredType::String {
            format: Some(StringFormat::Email),
        };
        let plain = InferredType::String { format: None };
        assert_eq!(email.merge_with(&email), email);
        assert_eq!(email.merge_with(&plain), plain);
    }

    #[test]
    fn test_merge_objects_marks_missing_optional() {
        let a = InferredType::Object {
            fields: vec![
                InferredField::new("id", InferredType::Integer),
                InferredField::new("name", InferredType::String { format: None }),
            ],
        };
        let b = InferredType::Object {
            fields: vec![
                InferredField::new("id", InferredType::Integer),
                InferredField::new("age", InferredType::Null),
            ],
        };
        let InferredType::Object { fields } = a.merge_with(&b) else {
            panic!("expected object");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert!(fields[0].required);
        assert_eq!(fields[0].occurrences, 2);
        assert!(!fields[1].required);
        assert!(!fields[2].required);
        assert!(fields[2].nullable);
    }

    #[test]
    fn test_field_to_node() {
        let field = InferredField {
            name: "tag".to_string(),
            field_type: InferredType::String { format: None },
            required: false,
            nullable: true,
            occurrences: 1,
        };
        assert_eq!(field.to_node(false), SchemaNode::string().nullable().optional());
    }
}
