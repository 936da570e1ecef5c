//! Schema inference engine

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::InferenceConfig;
use super::error::InferenceError;
use super::formats::detect_format;
use super::types::{InferredField, InferredType};
use crate::models::{Declaration, JsonValue, SchemaDocument};

/// Statistics from schema inference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceStats {
    /// Total records processed
    pub records_processed: usize,
    /// Maximum nesting depth encountered
    pub max_depth: usize,
}

/// Schema inference engine
///
/// Every added value is folded into a single inferred type; the result is a
/// document holding one declaration named after `config.root_name`.
pub struct SchemaInferrer {
    config: InferenceConfig,
    inferred: Option<InferredType>,
    stats: InferenceStats,
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInferrer {
    /// Create a new schema inferrer with default configuration
    pub fn new() -> Self {
        Self::with_config(InferenceConfig::default())
    }

    /// Create a new schema inferrer with custom configuration
    pub fn with_config(config: InferenceConfig) -> Self {
        Self {
            config,
            inferred: None,
            stats: InferenceStats::default(),
        }
    }

    /// Add a parsed JSON value for analysis
    pub fn add_value(&mut self, value: &JsonValue) -> Result<(), InferenceError> {
        let observed = self.infer_value(value, 0)?;
        self.inferred = Some(match self.inferred.take() {
            Some(existing) => existing.merge_with(&observed),
            None => observed,
        });
        self.stats.records_processed += 1;
        Ok(())
    }

    /// Inference statistics so far
    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }

    /// Finish inference and build the schema document
    pub fn finalize(self) -> Result<SchemaDocument, InferenceError> {
        let inferred = self.inferred.ok_or(InferenceError::NoRecords)?;
        debug!(
            records = self.stats.records_processed,
            max_depth = self.stats.max_depth,
            root = %inferred.type_name(),
            "Inferred schema"
        );
        let mut doc = SchemaDocument::new();
        doc.add(Declaration::new(
            self.config.root_name,
            inferred.to_node(self.config.integer_checks),
        ));
        Ok(doc)
    }

    fn infer_value(&mut self, value: &JsonValue, depth: usize) -> Result<InferredType, InferenceError> {
        if depth > self.config.max_depth {
            return Err(InferenceError::MaxDepthExceeded {
                depth,
                max: self.config.max_depth,
            });
        }
        self.stats.max_depth = self.stats.max_depth.max(depth);

        Ok(match value {
            JsonValue::Null => InferredType::Null,
            JsonValue::Bool(_) => InferredType::Boolean,
            JsonValue::Number(_) if value.is_integer() => InferredType::Integer,
            JsonValue::Number(_) => InferredType::Number,
            JsonValue::String(s) => InferredType::String {
                format: if self.config.detect_formats {
                    detect_format(s)
                } else {
                    None
                },
            },
            JsonValue::Date(_) => InferredType::Date,
            JsonValue::Array(items) => {
                let mut merged = InferredType::Unknown;
                let mut nullable = false;
                for item in items {
                    let item_type = self.infer_value(item, depth + 1)?;
                    nullable |= item_type == InferredType::Null;
                    merged = merged.merge_with(&item_type);
                }
                InferredType::Array {
                    items: Box::new(merged),
                    nullable,
                }
            }
            JsonValue::Object(object) => {
                let mut fields = Vec::with_capacity(object.len());
                for (key, field_value) in object.iter() {
                    let field_type = self.infer_value(field_value, depth + 1)?;
                    fields.push(InferredField::new(key, field_type));
                }
                InferredType::Object { fields }
            }
        })
    }
}

/// Infer a single-declaration document from one JSON value.
///
/// A root array yields `Root = T[]` with the element shapes merged.
pub fn infer_schema(value: &JsonValue, config: &InferenceConfig) -> Result<SchemaDocument, InferenceError> {
    let mut inferrer = SchemaInferrer::with_config(config.clone());
    inferrer.add_value(value)?;
    inferrer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, SchemaNode, StringChecks, StringFormat};

    fn infer(json: &str) -> SchemaNode {
        let value = JsonValue::parse(json).unwrap();
        let doc = infer_schema(&value, &InferenceConfig::default()).unwrap();
        doc.declarations[0].node.clone()
    }

    #[test]
    fn test_simple_object() {
        let node = infer(r#"{"name": "Alice", "age": 30, "active": true, "score": 1.5}"#);
        assert_eq!(
            node,
            SchemaNode::object(vec![
                Field::new("name", SchemaNode::string()),
                Field::new("age", SchemaNode::number()),
                Field::new("active", SchemaNode::Boolean),
                Field::new("score", SchemaNode::number()),
            ])
        );
    }

    #[test]
    fn test_array_of_objects_merges_shapes() {
        let node = infer(r#"[{"id": 1, "tag": "a"}, {"id": 2.5, "tag": null}, {"id": 3, "extra": true}]"#);
        assert_eq!(
            node,
            SchemaNode::array(SchemaNode::object(vec![
                Field::new("id", SchemaNode::number()),
                Field::new("tag", SchemaNode::string().nullable().optional()),
                Field::new("extra", SchemaNode::Boolean.optional()),
            ]))
        );
    }

    #[test]
    fn test_mixed_and_empty_arrays() {
        let node = infer(r#"{"values": [1, "two", null], "empty": []}"#);
        assert_eq!(
            node,
            SchemaNode::object(vec![
                Field::new(
                    "values",
                    SchemaNode::array(
                        SchemaNode::Union {
                            options: vec![SchemaNode::number(), SchemaNode::string()],
                        }
                        .nullable()
                    ),
                ),
                Field::new("empty", SchemaNode::array(SchemaNode::Unknown)),
            ])
        );
    }

    #[test]
    fn test_formats_detected() {
        let node = infer(r#"{"email": "a@b.io", "at": "2024-01-15T10:30:00Z"}"#);
        assert_eq!(
            node,
            SchemaNode::object(vec![
                Field::new(
                    "email",
                    SchemaNode::String(StringChecks {
                        format: Some(StringFormat::Email),
                        ..Default::default()
                    }),
                ),
                Field::new(
                    "at",
                    SchemaNode::String(StringChecks {
                        format: Some(StringFormat::Datetime),
                        ..Default::default()
                    }),
                ),
            ])
        );
    }

    #[test]
    fn test_multiple_records() {
        let mut inferrer = SchemaInferrer::with_config(
            InferenceConfig::builder().root_name("Event").integer_checks(true).build(),
        );
        inferrer.add_value(&JsonValue::parse(r#"{"n": 1}"#).unwrap()).unwrap();
        inferrer.add_value(&JsonValue::parse(r#"{"n": 2, "m": "x"}"#).unwrap()).unwrap();
        assert_eq!(inferrer.stats().records_processed, 2);

        let doc = inferrer.finalize().unwrap();
        assert_eq!(doc.declarations[0].name, "Event");
        assert_eq!(
            doc.declarations[0].node,
            SchemaNode::object(vec![
                Field::new("n", SchemaNode::integer()),
                Field::new("m", SchemaNode::string().optional()),
            ])
        );
    }

    #[test]
    fn test_no_records() {
        assert_eq!(SchemaInferrer::new().finalize(), Err(InferenceError::NoRecords));
    }

    #[test]
    fn test_max_depth() {
        let config = InferenceConfig::builder().max_depth(2).build();
        let value = JsonValue::parse(r#"{"a": {"b": {"c": 1}}}"#).unwrap();
        assert_eq!(
            infer_schema(&value, &config),
            Err(InferenceError::MaxDepthExceeded { depth: 3, max: 2 })
        );
    }
}
