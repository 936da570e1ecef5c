//! Format detection for string values

use crate::models::StringFormat;
use once_cell::sync::Lazy;
use regex::Regex;

static DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?(Z|[+-]\d{2}:?\d{2})$").unwrap()
});

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());

/// Detect the format of a string value
pub fn detect_format(value: &str) -> Option<StringFormat> {
    if UUID_REGEX.is_match(value) {
        Some(StringFormat::Uuid)
    } else if EMAIL_REGEX.is_match(value) {
        Some(StringFormat::Email)
    } else if DATETIME_REGEX.is_match(value) {
        Some(StringFormat::Datetime)
    } else if URL_REGEX.is_match(value) {
        Some(StringFormat::Url)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_formats() {
        assert_eq!(
            detect_format("550e8400-e29b-41d4-a716-446655440000"),
            Some(StringFormat::Uuid)
        );
        assert_eq!(detect_format("user@example.com"), Some(StringFormat::Email));
        assert_eq!(
            detect_format("2024-01-15T10:30:00.000Z"),
            Some(StringFormat::Datetime)
        );
        assert_eq!(detect_format("https://example.com/a"), Some(StringFormat::Url));
        assert_eq!(detect_format("2024-01-15"), None);
        assert_eq!(detect_format("hello"), None);
    }
}
