//! Identifier normalization for generated SQL.
//!
//! Every table and column name the relational compilers emit goes through
//! [`normalize_identifier`], which yields lower-case snake_case restricted to
//! `[a-z0-9_]` with no leading, trailing or repeated underscores. Applying it
//! twice gives the same result as applying it once.

/// Normalize a name into a SQL identifier.
///
/// Case boundaries become underscores (`createdAt` -> `created_at`), runs of
/// capitals are kept together (`userID` -> `user_id`, `HTTPServer` ->
/// `http_server`), and every other character outside `[a-z0-9_]` becomes an
/// underscore before underscores are collapsed and trimmed.
///
/// # Examples
///
/// ```
/// use data_conversion_sdk::validation::identifiers::normalize_identifier;
///
/// assert_eq!(normalize_identifier("firstName"), "first_name");
/// assert_eq!(normalize_identifier("  Order Items! "), "order_items");
/// assert_eq!(normalize_identifier("__a__b__"), "a_b");
/// ```
pub fn normalize_identifier(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut spaced = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary {
                spaced.push('_');
            }
            spaced.push(c.to_ascii_lowercase());
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            spaced.push(c);
        } else {
            spaced.push('_');
        }
    }

    let mut out = String::with_capacity(spaced.len());
    for c in spaced.chars() {
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Normalize a name, substituting `fallback` when nothing usable remains.
pub fn normalize_identifier_or(name: &str, fallback: &str) -> String {
    let normalized = normalize_identifier(name);
    if normalized.is_empty() {
        normalize_identifier(fallback)
    } else {
        normalized
    }
}

/// Whether a name is already a normalized identifier
pub fn is_normalized(name: &str) -> bool {
    !name.is_empty() && normalize_identifier(name) == name
}

/// Whether a field name looks like a key: `id` or `*_id`, case-insensitively.
pub fn is_id_like(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "id" || lower.ends_with("_id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_and_pascal_case() {
        assert_eq!(normalize_identifier("firstName"), "first_name");
        assert_eq!(normalize_identifier("FirstName"), "first_name");
        assert_eq!(normalize_identifier("userID"), "user_id");
        assert_eq!(normalize_identifier("HTTPServer"), "http_server");
        assert_eq!(normalize_identifier("address2Line"), "address2_line");
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(normalize_identifier("order-items"), "order_items");
        assert_eq!(normalize_identifier("a.b c"), "a_b_c");
        assert_eq!(normalize_identifier("prénom"), "pr_nom");
        assert_eq!(normalize_identifier("$$$"), "");
    }

    #[test]
    fn test_underscores_collapsed_and_trimmed() {
        assert_eq!(normalize_identifier("__private__"), "private");
        assert_eq!(normalize_identifier("a___b"), "a_b");
        assert_eq!(normalize_identifier("user_Id"), "user_id");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "firstName",
            "HTTPServer",
            "__a__B__c",
            "Order Items!",
            "xMLHttpRequest",
            "ÄÖÜ",
            "already_snake",
            "id",
            "A1B2c3",
            "",
        ];
        for sample in samples {
            let once = normalize_identifier(sample);
            assert_eq!(normalize_identifier(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn test_output_alphabet() {
        let out = normalize_identifier("Weird  Name-With.Various/Chars_ÿ");
        assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        assert!(!out.starts_with('_') && !out.ends_with('_') && !out.contains("__"));
    }

    #[test]
    fn test_fallback_and_id_detection() {
        assert_eq!(normalize_identifier_or("???", "column"), "column");
        assert_eq!(normalize_identifier_or("Name", "column"), "name");
        assert!(is_id_like("ID"));
        assert!(is_id_like("user_id"));
        assert!(is_id_like("Order_ID"));
        assert!(!is_id_like("identity"));
        assert!(!is_id_like("userId"));
        assert!(is_normalized("user_id"));
        assert!(!is_normalized("userId"));
    }
}
