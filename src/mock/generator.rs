//! Schema-driven mock instance generator

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::faker;
use crate::export::ExportError;
use crate::models::{
    Field, JsonObject, JsonValue, Literal, NumberChecks, SchemaDocument, SchemaNode, StringChecks,
    StringFormat,
};

/// Options controlling mock generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MockOptions {
    /// Seed for reproducible output; entropy when unset
    pub seed: Option<u64>,
    pub min_array_len: usize,
    pub max_array_len: usize,
    /// Number of entries generated for record/map shapes
    pub record_keys: usize,
    /// Nesting depth at which recursive shapes are cut off
    pub max_depth: usize,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            seed: None,
            min_array_len: 1,
            max_array_len: 3,
            record_keys: 1,
            max_depth: 8,
        }
    }
}

impl MockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_array_len(mut self, min: usize, max: usize) -> Self {
        self.min_array_len = min;
        self.max_array_len = max.max(min);
        self
    }

    pub fn with_record_keys(mut self, count: usize) -> Self {
        self.record_keys = count;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Generates JSON instances conforming to the root declaration of a document.
pub struct MockGenerator<'a> {
    doc: &'a SchemaDocument,
    options: MockOptions,
    rng: StdRng,
    /// References being expanded, with the depth they were entered at
    resolving: Vec<(String, usize)>,
}

impl<'a> MockGenerator<'a> {
    pub fn new(doc: &'a SchemaDocument, options: MockOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            doc,
            options,
            rng,
            resolving: Vec::new(),
        }
    }

    /// Generate one instance of the root declaration.
    pub fn generate(&mut self) -> Result<JsonValue, ExportError> {
        let doc = self.doc;
        let root = doc
            .root()
            .ok_or_else(|| ExportError::EmptyInput("schema".to_string()))?;
        Ok(self.node(&root.node, None, 0)?.unwrap_or(JsonValue::Null))
    }

    /// Generate `count` independent instances.
    pub fn generate_many(&mut self, count: usize) -> Result<Vec<JsonValue>, ExportError> {
        let instances = (0..count)
            .map(|_| self.generate())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = instances.len(), "Generated mock instances");
        Ok(instances)
    }

    /// `None` means the member is absent (an `undefined` value).
    fn node(
        &mut self,
        node: &SchemaNode,
        key: Option<&str>,
        depth: usize,
    ) -> Result<Option<JsonValue>, ExportError> {
        let max = self.options.max_depth;
        // Containers whose contents would reach the limit are cut off
        if depth + 1 >= max {
            match node {
                SchemaNode::Array { .. } => return Ok(Some(JsonValue::Array(Vec::new()))),
                SchemaNode::Record { .. } => return Ok(Some(JsonValue::Object(JsonObject::new()))),
                SchemaNode::Nullable { .. } => return Ok(Some(JsonValue::Null)),
                SchemaNode::Optional { .. } => return Ok(None),
                _ if depth > max => {
                    return Err(ExportError::DepthLimitExceeded { depth, max });
                }
                _ => {}
            }
        }

        let value = match node {
            SchemaNode::String(checks) => JsonValue::String(self.string(checks, key)),
            SchemaNode::Number(checks) => self.number(checks, key)?,
            SchemaNode::BigInt => JsonValue::from_i64(self.rng.gen_range(0..1_000_000)),
            SchemaNode::Boolean => JsonValue::Bool(self.rng.gen_bool(0.5)),
            SchemaNode::Date => JsonValue::Date(
                faker::datetime(&mut self.rng)
                    .ok_or_else(|| ExportError::Serialization("timestamp out of range".to_string()))?,
            ),
            SchemaNode::Null | SchemaNode::Never => JsonValue::Null,
            SchemaNode::Undefined => return Ok(None),
            SchemaNode::Any | SchemaNode::Unknown => JsonValue::String(faker::word(&mut self.rng)),
            SchemaNode::Literal { value } => literal(value)?,
            SchemaNode::Enum { values } => match values.choose(&mut self.rng) {
                Some(value) => JsonValue::String(value.clone()),
                None => JsonValue::Null,
            },
            SchemaNode::Object { fields } => JsonValue::Object(self.object(fields, depth)?),
            SchemaNode::Array { items } => {
                let low = self.options.min_array_len;
                let len = self.rng.gen_range(low..=self.options.max_array_len.max(low));
                let mut out = Vec::with_capacity(len);
                for _ in 0..len {
                    out.push(self.node(items, key, depth + 1)?.unwrap_or(JsonValue::Null));
                }
                JsonValue::Array(out)
            }
            SchemaNode::Tuple { items } => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.node(item, key, depth + 1)?.unwrap_or(JsonValue::Null));
                }
                JsonValue::Array(out)
            }
            SchemaNode::Record { key: key_node, value } => {
                let mut out = JsonObject::new();
                for index in 0..self.options.record_keys {
                    let name = match self.node(key_node, None, depth + 1)? {
                        Some(JsonValue::String(s)) => s,
                        Some(other) => other.to_compact_string()?,
                        None => format!("key{index}"),
                    };
                    if let Some(entry) = self.node(value, Some(&name), depth + 1)? {
                        out.insert(name, entry);
                    }
                }
                JsonValue::Object(out)
            }
            SchemaNode::Union { options } => {
                let mut order: Vec<&SchemaNode> = options.iter().collect();
                order.shuffle(&mut self.rng);
                let mut cycle = None;
                // A member that only leads back into a cycle gives way to the next one
                for option in order {
                    match self.node(option, key, depth) {
                        Err(err @ ExportError::CyclicReference(_)) => cycle = Some(err),
                        other => return other,
                    }
                }
                return match cycle {
                    Some(err) => Err(err),
                    None => Ok(Some(JsonValue::Null)),
                };
            }
            SchemaNode::Intersection { parts } => {
                let mut merged: Option<JsonValue> = None;
                for part in parts {
                    let Some(value) = self.node(part, key, depth)? else {
                        continue;
                    };
                    merged = Some(match (merged, value) {
                        (Some(JsonValue::Object(mut base)), JsonValue::Object(extra)) => {
                            for (name, entry) in extra.iter() {
                                base.insert(name, entry.clone());
                            }
                            JsonValue::Object(base)
                        }
                        (_, value) => value,
                    });
                }
                return Ok(merged);
            }
            // Optional and nullable members are always populated so the sample is complete
            SchemaNode::Optional { inner } | SchemaNode::Nullable { inner } => {
                return self.node(inner, key, depth);
            }
            SchemaNode::Ref { name } => {
                let doc = self.doc;
                let declaration = doc
                    .get(name)
                    .ok_or_else(|| ExportError::UnresolvedReference(name.clone()))?;
                if self.resolving.iter().any(|(entered, at)| entered == name && *at == depth) {
                    return Err(ExportError::CyclicReference(name.clone()));
                }
                self.resolving.push((name.clone(), depth));
                let result = self.node(&declaration.node, key, depth);
                self.resolving.pop();
                return result;
            }
        };
        Ok(Some(value))
    }

    fn object(&mut self, fields: &[Field], depth: usize) -> Result<JsonObject, ExportError> {
        let mut out = JsonObject::new();
        for field in fields {
            if let Some(value) = self.node(&field.node, Some(&field.name), depth + 1)? {
                out.insert(field.name.clone(), value);
            }
        }
        Ok(out)
    }

    fn string(&mut self, checks: &StringChecks, key: Option<&str>) -> String {
        let rng = &mut self.rng;
        let mut value = match checks.format {
            Some(StringFormat::Email) => faker::email(rng),
            Some(StringFormat::Uuid) => faker::uuid(rng),
            Some(StringFormat::Url) => faker::url(rng),
            Some(StringFormat::Datetime) => match faker::datetime(rng) {
                Some(at) => crate::models::format_timestamp(&at),
                None => faker::word(rng),
            },
            None => key
                .and_then(|key| faker::string_for_key(key, rng))
                .unwrap_or_else(|| faker::word(rng)),
        };

        if checks.format.is_none() {
            if let Some(max) = checks.max_length {
                value = value.chars().take(max).collect();
            }
            if let Some(min) = checks.min_length {
                while value.chars().count() < min {
                    value.push(rng.gen_range(b'a'..=b'z') as char);
                }
            }
        }
        value
    }

    fn number(&mut self, checks: &NumberChecks, key: Option<&str>) -> Result<JsonValue, ExportError> {
        let lower_key = key.map(str::to_ascii_lowercase).unwrap_or_default();
        let (default_min, default_max) = if lower_key == "age" {
            (18.0, 90.0)
        } else if lower_key.contains("year") {
            (1990.0, 2030.0)
        } else {
            (0.0, 1000.0)
        };
        let min = checks.min.unwrap_or(match checks.max {
            Some(max) if max < default_min => max - (default_max - default_min),
            _ => default_min,
        });
        let max = checks.max.unwrap_or(match checks.min {
            Some(min) if min > default_max => min + (default_max - default_min),
            _ => default_max,
        });
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ExportError::Serialization(format!(
                "cannot generate a number between {min} and {max}"
            )));
        }

        if checks.integer {
            let (low, high) = (min.ceil() as i64, max.floor() as i64);
            if low > high {
                return Err(ExportError::Serialization(format!(
                    "no integer between {min} and {max}"
                )));
            }
            return Ok(JsonValue::from_i64(self.rng.gen_range(low..=high)));
        }

        let raw = if min == max {
            min
        } else {
            // Interpolated so the result stays finite when `max - min` overflows
            let t: f64 = self.rng.r#gen();
            min * (1.0 - t) + max * t
        };
        let rounded = if raw.abs() < 1e15 {
            (raw * 100.0).round() / 100.0
        } else {
            raw
        };
        let value = rounded.clamp(min, max);
        JsonValue::from_f64(value)
            .ok_or_else(|| ExportError::Serialization(format!("non-finite number {value}")))
    }
}

fn literal(value: &Literal) -> Result<JsonValue, ExportError> {
    Ok(match value {
        Literal::String(s) => JsonValue::String(s.clone()),
        Literal::Bool(b) => JsonValue::Bool(*b),
        Literal::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => JsonValue::from_i64(*n as i64),
        Literal::Number(n) => JsonValue::from_f64(*n)
            .ok_or_else(|| ExportError::Serialization(format!("non-finite literal {n}")))?,
    })
}

/// Generate `count` mock instances as pretty-printed JSON.
///
/// One instance prints as an object, any other count as an array of exactly
/// `count` elements.
pub fn generate_mocks(
    doc: &SchemaDocument,
    count: usize,
    options: &MockOptions,
) -> Result<String, ExportError> {
    let mut generator = MockGenerator::new(doc, options.clone());
    let value = if count == 1 {
        generator.generate()?
    } else {
        JsonValue::Array(generator.generate_many(count)?)
    };
    Ok(value.to_pretty_string()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::TypeScriptImporter;

    fn seeded() -> MockOptions {
        MockOptions::new().with_seed(42)
    }

    fn doc(source: &str) -> SchemaDocument {
        TypeScriptImporter::new().parse(source).unwrap()
    }

    #[test]
    fn test_object_conforms() {
        let doc = doc(
            r#"type User = {
                id: number;
                email: string;
                name: string;
                active: boolean;
                createdAt: Date;
                nickname?: string;
                tags: string[];
                role: "admin" | "member";
            }"#,
        );
        let value = MockGenerator::new(&doc, seeded()).generate().unwrap();
        let object = value.as_object().unwrap();

        assert!(object.get("id").unwrap().as_f64().is_some());
        assert!(object.get("email").unwrap().as_str().unwrap().contains('@'));
        assert!(matches!(object.get("active"), Some(JsonValue::Bool(_))));
        assert!(matches!(object.get("createdAt"), Some(JsonValue::Date(_))));
        assert!(object.contains_key("nickname"));
        let tags = object.get("tags").unwrap().as_array().unwrap();
        assert!((1..=3).contains(&tags.len()));
        let role = object.get("role").unwrap().as_str().unwrap();
        assert!(role == "admin" || role == "member");
    }

    #[test]
    fn test_seed_is_reproducible() {
        let doc = doc("{ name: string; score: number; items: { sku: string }[] }");
        let first = generate_mocks(&doc, 3, &seeded()).unwrap();
        let second = generate_mocks(&doc, 3, &seeded()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_count_shapes_output() {
        let doc = doc("{ name: string }");
        let one = JsonValue::parse(&generate_mocks(&doc, 1, &seeded()).unwrap()).unwrap();
        assert!(one.as_object().is_some());

        let three = JsonValue::parse(&generate_mocks(&doc, 3, &seeded()).unwrap()).unwrap();
        assert_eq!(three.as_array().unwrap().len(), 3);

        assert_eq!(generate_mocks(&doc, 0, &seeded()).unwrap(), "[]");
    }

    #[test]
    fn test_formats_beat_key_hints() {
        let doc = crate::import::ZodImporter::new()
            .parse("z.object({ email: z.string().uuid(), age: z.number().int().min(3).max(5) })")
            .unwrap();
        let value = MockGenerator::new(&doc, seeded()).generate().unwrap();
        let object = value.as_object().unwrap();
        let email = object.get("email").unwrap().as_str().unwrap();
        assert_eq!(email.len(), 36);
        assert!(!email.contains('@'));
        let age = object.get("age").unwrap().as_f64().unwrap();
        assert!((3.0..=5.0).contains(&age));
        assert_eq!(age.fract(), 0.0);
    }

    #[test]
    fn test_string_length_bounds() {
        let doc = crate::import::ZodImporter::new()
            .parse("z.object({ code: z.string().min(12).max(14) })")
            .unwrap();
        let value = MockGenerator::new(&doc, seeded()).generate().unwrap();
        let code = value.as_object().unwrap().get("code").unwrap().as_str().unwrap().len();
        assert!((12..=14).contains(&code));
    }

    #[test]
    fn test_undefined_members_are_omitted() {
        let doc = doc("{ gone: undefined; kept: null }");
        let value = MockGenerator::new(&doc, seeded()).generate().unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("gone"));
        assert_eq!(object.get("kept"), Some(&JsonValue::Null));
    }

    #[test]
    fn test_recursion_stops_at_max_depth() {
        let doc = doc("type Node = { name: string; children: Node[] };");
        let value = MockGenerator::new(&doc, seeded().with_max_depth(4))
            .generate()
            .unwrap();
        assert!(value.as_object().unwrap().contains_key("children"));

        let doc = self::doc("type Node = { name: string; next: Node };");
        let err = MockGenerator::new(&doc, seeded().with_max_depth(4))
            .generate()
            .unwrap_err();
        assert!(matches!(err, ExportError::DepthLimitExceeded { max: 4, .. }));
    }

    #[test]
    fn test_unresolved_reference() {
        let mut doc = SchemaDocument::new();
        doc.add(crate::models::Declaration::new(
            "Order",
            SchemaNode::object(vec![Field::new("customer", SchemaNode::reference("Customer"))]),
        ));
        let err = MockGenerator::new(&doc, seeded()).generate().unwrap_err();
        assert!(matches!(err, ExportError::UnresolvedReference(ref name) if name == "Customer"));
    }

    #[test]
    fn test_alias_cycle_is_an_error() {
        let doc = doc("type A = B; type B = A;");
        let err = MockGenerator::new(&doc, seeded()).generate().unwrap_err();
        assert!(matches!(err, ExportError::CyclicReference(_)));
    }

    #[test]
    fn test_union_escapes_cycle() {
        let doc = doc("type Text = Text | string;");
        for seed in 0..8 {
            let value = MockGenerator::new(&doc, MockOptions::new().with_seed(seed))
                .generate()
                .unwrap();
            assert!(value.as_str().is_some());
        }
    }

    #[test]
    fn test_extreme_number_bounds() {
        let doc = crate::import::ZodImporter::new()
            .parse("z.object({ n: z.number().min(-1e308).max(1e308), m: z.number().min(1e307).max(1.7e308) })")
            .unwrap();
        for seed in 0..16 {
            let value = MockGenerator::new(&doc, MockOptions::new().with_seed(seed))
                .generate()
                .unwrap();
            let object = value.as_object().unwrap();
            let n = object.get("n").unwrap().as_f64().unwrap();
            assert!((-1e308..=1e308).contains(&n));
            let m = object.get("m").unwrap().as_f64().unwrap();
            assert!((1e307..=1.7e308).contains(&m));
        }
    }

    #[test]
    fn test_record_and_intersection() {
        let doc = doc(
            "type A = { a: string }; type B = { b: number }; type Root = { map: Record<string, A & B> };",
        );
        let value = MockGenerator::new(&doc, seeded().with_record_keys(2))
            .generate()
            .unwrap();
        let map = value.as_object().unwrap().get("map").unwrap().as_object().unwrap();
        assert!(!map.is_empty());
        let (_, entry) = map.iter().next().unwrap();
        let entry = entry.as_object().unwrap();
        assert!(entry.contains_key("a") && entry.contains_key("b"));
    }
}
