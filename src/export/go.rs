//! Go struct declarations from JSON samples.
//!
//! Produces a single `type AutoGenerated struct { ... }` with nested objects
//! declared inline, `json` tags carrying the original keys and columns
//! aligned the way `gofmt` aligns them.

use crate::export::{ExportError, ExportResult};
use crate::models::{JsonObject, JsonValue};
use chrono::DateTime;
use std::collections::BTreeSet;

/// Default name of the generated type
pub const DEFAULT_TYPE_NAME: &str = "AutoGenerated";

/// Words written in upper case inside Go identifiers
const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

/// A generated declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub code: String,
}

/// Generates a struct declaration for a JSON value.
pub trait StructCodegen {
    fn json_to_struct_decl(&self, value: &JsonValue) -> Result<StructDecl, ExportError>;
}

#[derive(Debug, Clone, PartialEq)]
enum GoType {
    Int,
    Int64,
    Float64,
    Bool,
    String,
    Time,
    /// `null`, or elements of conflicting kinds
    Any,
    Slice(Box<GoType>),
    Struct(Vec<GoField>),
}

#[derive(Debug, Clone, PartialEq)]
struct GoField {
    key: String,
    ty: GoType,
    omitempty: bool,
}

/// Go struct generator.
///
/// # Example
///
/// ```rust
/// use data_conversion_sdk::export::go::{GoStructExporter, StructCodegen};
/// use data_conversion_sdk::models::JsonValue;
///
/// let value = JsonValue::parse(r#"{"user_id": 1, "name": "x"}"#).unwrap();
/// let decl = GoStructExporter::new().json_to_struct_decl(&value).unwrap();
/// assert!(decl.code.contains("UserID int    `json:\"user_id\"`"));
/// ```
#[derive(Debug, Clone)]
pub struct GoStructExporter {
    pub type_name: String,
}

impl Default for GoStructExporter {
    fn default() -> Self {
        Self {
            type_name: DEFAULT_TYPE_NAME.to_string(),
        }
    }
}

impl GoStructExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type_name(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    /// Generate Go source for a JSON value (SDK interface).
    pub fn export(&self, value: &JsonValue) -> Result<ExportResult, ExportError> {
        Ok(ExportResult {
            content: self.json_to_struct_decl(value)?.code,
            format: "go".to_string(),
        })
    }
}

impl StructCodegen for GoStructExporter {
    fn json_to_struct_decl(&self, value: &JsonValue) -> Result<StructDecl, ExportError> {
        let ty = type_of(value);
        let mut code = format!("type {} ", go_identifier(&self.type_name));
        render_type(&ty, 0, &mut code);
        Ok(StructDecl { code })
    }
}

fn type_of(value: &JsonValue) -> GoType {
    match value {
        JsonValue::Null => GoType::Any,
        JsonValue::Bool(_) => GoType::Bool,
        JsonValue::Number(_) if value.is_integer() => match value.as_f64() {
            Some(n) if n.abs() > i32::MAX as f64 => GoType::Int64,
            _ => GoType::Int,
        },
        JsonValue::Number(_) => GoType::Float64,
        JsonValue::Date(_) => GoType::Time,
        JsonValue::String(s) if DateTime::parse_from_rfc3339(s).is_ok() => GoType::Time,
        JsonValue::String(_) => GoType::String,
        JsonValue::Array(items) => GoType::Slice(Box::new(element_type(items))),
        JsonValue::Object(object) => struct_of(&[object]),
    }
}

fn element_type(items: &[JsonValue]) -> GoType {
    let objects: Vec<&JsonObject> = items.iter().filter_map(JsonValue::as_object).collect();
    if !objects.is_empty() && objects.len() == items.iter().filter(|v| !v.is_null()).count() {
        return struct_of(&objects);
    }
    items
        .iter()
        .map(type_of)
        .reduce(merge)
        .unwrap_or(GoType::Any)
}

/// One struct covering every object; keys missing from some get `omitempty`.
fn struct_of(objects: &[&JsonObject]) -> GoType {
    let mut keys: Vec<&str> = Vec::new();
    for object in objects {
        for key in object.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    let fields = keys
        .into_iter()
        .map(|key| {
            let values: Vec<&JsonValue> = objects.iter().filter_map(|o| o.get(key)).collect();
            let nested: Vec<&JsonObject> = values.iter().filter_map(|v| v.as_object()).collect();
            let ty = if !nested.is_empty() && nested.len() == values.len() {
                struct_of(&nested)
            } else if values.iter().all(|v| matches!(v, JsonValue::Array(_))) && values.len() > 1 {
                let all_items: Vec<JsonValue> = values
                    .iter()
                    .filter_map(|v| v.as_array())
                    .flat_map(|items| items.iter().cloned())
                    .collect();
                GoType::Slice(Box::new(element_type(&all_items)))
            } else {
                values
                    .iter()
                    .map(|v| type_of(v))
                    .reduce(merge)
                    .unwrap_or(GoType::Any)
            };
            GoField {
                key: key.to_string(),
                ty,
                omitempty: values.len() < objects.len(),
            }
        })
        .collect();
    GoType::Struct(fields)
}

fn merge(a: GoType, b: GoType) -> GoType {
    match (a, b) {
        (a, b) if a == b => a,
        (GoType::Any, other) | (other, GoType::Any) => other,
        (GoType::Int, GoType::Int64) | (GoType::Int64, GoType::Int) => GoType::Int64,
        (GoType::Int | GoType::Int64, GoType::Float64)
        | (GoType::Float64, GoType::Int | GoType::Int64) => GoType::Float64,
        (GoType::Time, GoType::String) | (GoType::String, GoType::Time) => GoType::String,
        (GoType::Slice(a), GoType::Slice(b)) => GoType::Slice(Box::new(merge(*a, *b))),
        (GoType::Struct(a), GoType::Struct(b)) => merge_structs(a, b),
        _ => GoType::Any,
    }
}

fn merge_structs(a: Vec<GoField>, b: Vec<GoField>) -> GoType {
    let b_keys: BTreeSet<String> = b.iter().map(|f| f.key.clone()).collect();
    let mut fields: Vec<GoField> = Vec::with_capacity(a.len().max(b.len()));
    for mut field in a {
        if !b_keys.contains(&field.key) {
            field.omitempty = true;
        }
        fields.push(field);
    }
    for field in b {
        match fields.iter_mut().find(|f| f.key == field.key) {
            Some(existing) => {
                existing.ty = merge(existing.ty.clone(), field.ty);
                existing.omitempty |= field.omitempty;
            }
            None => fields.push(GoField {
                omitempty: true,
                ..field
            }),
        }
    }
    GoType::Struct(fields)
}

fn render_type(ty: &GoType, indent: usize, out: &mut String) {
    match ty {
        GoType::Int => out.push_str("int"),
        GoType::Int64 => out.push_str("int64"),
        GoType::Float64 => out.push_str("float64"),
        GoType::Bool => out.push_str("bool"),
        GoType::String => out.push_str("string"),
        GoType::Time => out.push_str("time.Time"),
        GoType::Any => out.push_str("any"),
        GoType::Slice(inner) => {
            out.push_str("[]");
            render_type(inner, indent, out);
        }
        GoType::Struct(fields) => render_struct(fields, indent, out),
    }
}

fn render_struct(fields: &[GoField], indent: usize, out: &mut String) {
    if fields.is_empty() {
        out.push_str("struct {\n");
        out.push_str(&"\t".repeat(indent));
        out.push('}');
        return;
    }

    let names = field_names(fields);
    let inner = "\t".repeat(indent + 1);
    let mut lines: Vec<(String, String, String, bool)> = Vec::with_capacity(fields.len());
    for (field, name) in fields.iter().zip(names) {
        let mut rendered = String::new();
        render_type(&field.ty, indent + 1, &mut rendered);
        let tag = if field.omitempty {
            format!("`json:\"{},omitempty\"`", field.key)
        } else {
            format!("`json:\"{}\"`", field.key)
        };
        let multiline = rendered.contains('\n');
        lines.push((name, rendered, tag, multiline));
    }

    out.push_str("struct {\n");
    // gofmt aligns runs of consecutive single-line fields
    let mut start = 0;
    while start < lines.len() {
        let mut end = start;
        while end < lines.len() && !lines[end].3 {
            end += 1;
        }
        let run = &lines[start..end];
        let name_width = run.iter().map(|l| l.0.chars().count()).max().unwrap_or(0);
        let type_width = run.iter().map(|l| l.1.chars().count()).max().unwrap_or(0);
        for (name, ty, tag, _) in run {
            out.push_str(&format!(
                "{inner}{name:<name_width$} {ty:<type_width$} {tag}\n"
            ));
        }
        if end < lines.len() {
            let (name, ty, tag, _) = &lines[end];
            out.push_str(&format!("{inner}{name} {ty} {tag}\n"));
            end += 1;
        }
        start = end;
    }
    out.push_str(&"\t".repeat(indent));
    out.push('}');
}

/// Exported field names, de-duplicated with numeric suffixes
fn field_names(fields: &[GoField]) -> Vec<String> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    fields
        .iter()
        .map(|field| {
            let base = go_identifier(&field.key);
            let mut name = base.clone();
            let mut n = 1;
            while !used.insert(name.clone()) {
                name = format!("{base}{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Convert a JSON key into an exported Go identifier.
///
/// `user_id` -> `UserID`, `avatarUrl` -> `AvatarURL`, `2fa` -> `Num2fa`.
pub fn go_identifier(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = matches!(prev, Some(p) if p.is_lowercase() && c.is_uppercase());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut name: String = words
        .iter()
        .map(|word| {
            let upper = word.to_uppercase();
            if INITIALISMS.contains(&upper.as_str()) {
                upper
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect();

    if name.is_empty() {
        name = "Field".to_string();
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Num");
    }
    name
}
