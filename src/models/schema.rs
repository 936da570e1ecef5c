//! Canonical schema model
//!
//! The notation-independent description of a data shape. Both the TypeScript
//! and the Zod importers produce a [`SchemaDocument`]; the exporters and the
//! mock generator consume it directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An ordered set of named declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub declarations: Vec<Declaration>,
}

/// A named shape (`type User = ...`, `const userSchema = ...`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declaration name in type notation (e.g. `User`)
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub node: SchemaNode,
}

/// A member of an object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Optional members are wrapped in [`SchemaNode::Optional`].
    pub node: SchemaNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// String formats understood by the validation notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Email,
    Uuid,
    Url,
    Datetime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringChecks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberChecks {
    #[serde(default)]
    pub integer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
}

/// A node of the canonical schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaNode {
    String(StringChecks),
    Number(NumberChecks),
    BigInt,
    Boolean,
    Date,
    Null,
    Undefined,
    Any,
    Unknown,
    Never,
    Literal { value: Literal },
    Enum { values: Vec<String> },
    Object { fields: Vec<Field> },
    Array { items: Box<SchemaNode> },
    Tuple { items: Vec<SchemaNode> },
    Record { key: Box<SchemaNode>, value: Box<SchemaNode> },
    Union { options: Vec<SchemaNode> },
    Intersection { parts: Vec<SchemaNode> },
    Optional { inner: Box<SchemaNode> },
    Nullable { inner: Box<SchemaNode> },
    Ref { name: String },
}

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::String(StringChecks::default())
    }

    pub fn number() -> Self {
        SchemaNode::Number(NumberChecks::default())
    }

    pub fn integer() -> Self {
        SchemaNode::Number(NumberChecks {
            integer: true,
            ..Default::default()
        })
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
        }
    }

    pub fn object(fields: Vec<Field>) -> Self {
        SchemaNode::Object { fields }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        SchemaNode::Ref { name: name.into() }
    }

    /// Wrap as optional; already-optional nodes are left alone.
    pub fn optional(self) -> Self {
        match self {
            SchemaNode::Optional { .. } => self,
            other => SchemaNode::Optional {
                inner: Box::new(other),
            },
        }
    }

    /// Wrap as nullable; already-nullable nodes are left alone.
    pub fn nullable(self) -> Self {
        match self {
            SchemaNode::Nullable { .. } => self,
            other => SchemaNode::Nullable {
                inner: Box::new(other),
            },
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, SchemaNode::Optional { .. })
    }

    /// Build a union, folding `undefined` members into [`SchemaNode::Optional`]
    /// and `null` members into [`SchemaNode::Nullable`].
    pub fn union(options: Vec<SchemaNode>) -> Self {
        let mut optional = false;
        let mut nullable = false;
        let mut rest = Vec::with_capacity(options.len());
        for option in options {
            match option {
                SchemaNode::Undefined => optional = true,
                SchemaNode::Null => nullable = true,
                SchemaNode::Union { options } => rest.extend(options),
                other => rest.push(other),
            }
        }

        let mut node = match rest.len() {
            0 if nullable => {
                nullable = false;
                SchemaNode::Null
            }
            0 => {
                optional = false;
                SchemaNode::Undefined
            }
            1 => rest.remove(0),
            _ => SchemaNode::Union { options: rest },
        };
        if nullable {
            node = node.nullable();
        }
        if optional {
            node = node.optional();
        }
        node
    }

    /// Names of declarations referenced anywhere below this node
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut BTreeSet<String>) {
        match self {
            SchemaNode::Ref { name } => {
                out.insert(name.clone());
            }
            SchemaNode::Object { fields } => {
                for field in fields {
                    field.node.collect_references(out);
                }
            }
            SchemaNode::Array { items } => items.collect_references(out),
            SchemaNode::Tuple { items } => {
                for item in items {
                    item.collect_references(out);
                }
            }
            SchemaNode::Record { key, value } => {
                key.collect_references(out);
                value.collect_references(out);
            }
            SchemaNode::Union { options } => {
                for option in options {
                    option.collect_references(out);
                }
            }
            SchemaNode::Intersection { parts } => {
                for part in parts {
                    part.collect_references(out);
                }
            }
            SchemaNode::Optional { inner } | SchemaNode::Nullable { inner } => {
                inner.collect_references(out)
            }
            _ => {}
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, node: SchemaNode) -> Self {
        Self {
            name: name.into(),
            node,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_optional(&self) -> bool {
        self.node.is_optional()
    }
}

impl Declaration {
    pub fn new(name: impl Into<String>, node: SchemaNode) -> Self {
        Self {
            name: name.into(),
            description: None,
            node,
        }
    }
}

impl SchemaDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with a single declaration
    pub fn single(name: impl Into<String>, node: SchemaNode) -> Self {
        Self {
            declarations: vec![Declaration::new(name, node)],
        }
    }

    pub fn add(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// The declaration other declarations are built towards.
    ///
    /// This is the first declaration nobody else references; if every
    /// declaration is referenced (mutual recursion) the last one wins.
    pub fn root(&self) -> Option<&Declaration> {
        let referenced: BTreeSet<String> = self
            .declarations
            .iter()
            .flat_map(|d| {
                let own = d.name.clone();
                d.node.references().into_iter().filter(move |r| *r != own)
            })
            .collect();
        self.declarations
            .iter()
            .find(|d| !referenced.contains(&d.name))
            .or_else(|| self.declarations.last())
    }

    /// Declarations ordered so that each one follows everything it references.
    ///
    /// Cycles keep their original relative order.
    pub fn dependency_order(&self) -> Vec<&Declaration> {
        let mut ordered: Vec<&Declaration> = Vec::with_capacity(self.declarations.len());
        let mut visiting = BTreeSet::new();
        for declaration in &self.declarations {
            self.visit(declaration, &mut visiting, &mut ordered);
        }
        ordered
    }

    fn visit<'a>(
        &'a self,
        declaration: &'a Declaration,
        visiting: &mut BTreeSet<String>,
        ordered: &mut Vec<&'a Declaration>,
    ) {
        if ordered.iter().any(|d| d.name == declaration.name)
            || !visiting.insert(declaration.name.clone())
        {
            return;
        }
        for name in declaration.node.references() {
            if let Some(dep) = self.get(&name) {
                self.visit(dep, visiting, ordered);
            }
        }
        ordered.push(declaration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_folds_undefined_and_null() {
        let node = SchemaNode::union(vec![SchemaNode::string(), SchemaNode::Undefined]);
        assert_eq!(node, SchemaNode::string().optional());

        let node = SchemaNode::union(vec![SchemaNode::Null, SchemaNode::number()]);
        assert_eq!(node, SchemaNode::number().nullable());

        let node = SchemaNode::union(vec![
            SchemaNode::string(),
            SchemaNode::Boolean,
            SchemaNode::Null,
            SchemaNode::Undefined,
        ]);
        assert_eq!(
            node,
            SchemaNode::Union {
                options: vec![SchemaNode::string(), SchemaNode::Boolean]
            }
            .nullable()
            .optional()
        );
    }

    #[test]
    fn test_optional_is_idempotent() {
        let node = SchemaNode::Boolean.optional().optional();
        assert_eq!(node, SchemaNode::Boolean.optional());
    }

    #[test]
    fn test_root_and_dependency_order() {
        let mut doc = SchemaDocument::new();
        doc.add(Declaration::new(
            "User",
            SchemaNode::object(vec![Field::new("address", SchemaNode::reference("Address"))]),
        ));
        doc.add(Declaration::new(
            "Address",
            SchemaNode::object(vec![Field::new("city", SchemaNode::string())]),
        ));

        assert_eq!(doc.root().unwrap().name, "User");
        let order: Vec<&str> = doc
            .dependency_order()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(order, vec!["Address", "User"]);
    }

    #[test]
    fn test_self_reference_is_still_root() {
        let doc = SchemaDocument::single(
            "Node",
            SchemaNode::object(vec![Field::new(
                "children",
                SchemaNode::array(SchemaNode::reference("Node")),
            )]),
        );
        assert_eq!(doc.root().unwrap().name, "Node");
        assert_eq!(doc.dependency_order().len(), 1);
    }
}
