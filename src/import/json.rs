//! JSON text import

use super::ImportError;
use crate::models::JsonValue;

/// Parse JSON text into a [`JsonValue`], keeping object key order.
pub fn parse_json(text: &str) -> Result<JsonValue, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty("JSON"));
    }
    Ok(JsonValue::parse(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object() {
        let value = parse_json(r#"{"a": [1, 2], "b": null}"#).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.get("b").unwrap().is_null());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_json("{\"a\": }"),
            Err(ImportError::InvalidJson(_))
        ));
        assert!(matches!(parse_json("   "), Err(ImportError::Empty(_))));
    }
}
