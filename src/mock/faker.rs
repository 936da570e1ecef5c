//! Value pools for realistic-looking strings

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bruno", "Chiara", "Dmitri", "Elena", "Farid", "Greta", "Hiro", "Ines", "Jonas",
    "Keiko", "Lars", "Maya", "Nils", "Olga", "Pablo",
];

const LAST_NAMES: &[&str] = &[
    "Andersen", "Becker", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Huber", "Ivanova",
    "Jensen", "Kowalski", "Lindqvist", "Moreau", "Novak",
];

const CITIES: &[&str] = &[
    "Amsterdam", "Berlin", "Copenhagen", "Dublin", "Lisbon", "Madrid", "Oslo", "Prague",
    "Vienna", "Zurich",
];

const COUNTRIES: &[&str] = &[
    "Austria", "Denmark", "France", "Germany", "Ireland", "Norway", "Portugal", "Spain",
];

const STREETS: &[&str] = &[
    "Main Street", "Station Road", "Park Lane", "Harbour Way", "Mill Street", "Church Road",
];

const COMPANIES: &[&str] = &[
    "Acme", "Globex", "Initech", "Umbrella", "Hooli", "Stark Industries", "Wayne Enterprises",
];

const COLORS: &[&str] = &["red", "green", "blue", "orange", "purple", "teal", "black"];

const DOMAINS: &[&str] = &["example.com", "example.org", "mail.test", "corp.test"];

const WORDS: &[&str] = &[
    "alpha", "bravo", "cargo", "delta", "ember", "fable", "grove", "harbor", "island", "jade",
    "kernel", "lumen", "meadow", "nimbus", "orbit", "prism", "quartz", "river", "summit",
    "timber", "velvet", "willow",
];

/// Epoch seconds of 2000-01-01 and 2030-01-01
const DATE_RANGE: (i64, i64) = (946_684_800, 1_893_456_000);

fn pick<R: Rng>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or("value")
}

pub fn first_name<R: Rng>(rng: &mut R) -> String {
    pick(rng, FIRST_NAMES).to_string()
}

pub fn last_name<R: Rng>(rng: &mut R) -> String {
    pick(rng, LAST_NAMES).to_string()
}

pub fn full_name<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", first_name(rng), last_name(rng))
}

pub fn username<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}{}",
        first_name(rng).to_lowercase(),
        rng.gen_range(1..1000)
    )
}

pub fn email<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}.{}@{}",
        first_name(rng).to_lowercase(),
        last_name(rng).to_lowercase(),
        pick(rng, DOMAINS)
    )
}

pub fn url<R: Rng>(rng: &mut R) -> String {
    format!("https://www.{}.{}", word(rng), pick(rng, &["com", "org", "io"]))
}

pub fn phone<R: Rng>(rng: &mut R) -> String {
    format!(
        "+{} {} {}",
        rng.gen_range(1..100),
        rng.gen_range(100..1000),
        rng.gen_range(1_000_000..10_000_000)
    )
}

pub fn city<R: Rng>(rng: &mut R) -> String {
    pick(rng, CITIES).to_string()
}

pub fn country<R: Rng>(rng: &mut R) -> String {
    pick(rng, COUNTRIES).to_string()
}

pub fn street<R: Rng>(rng: &mut R) -> String {
    format!("{} {}", rng.gen_range(1..200), pick(rng, STREETS))
}

pub fn postal_code<R: Rng>(rng: &mut R) -> String {
    format!("{:05}", rng.gen_range(1000..100_000))
}

pub fn company<R: Rng>(rng: &mut R) -> String {
    pick(rng, COMPANIES).to_string()
}

pub fn color<R: Rng>(rng: &mut R) -> String {
    pick(rng, COLORS).to_string()
}

pub fn word<R: Rng>(rng: &mut R) -> String {
    pick(rng, WORDS).to_string()
}

pub fn sentence<R: Rng>(rng: &mut R) -> String {
    let count = rng.gen_range(4..9);
    let words: Vec<&str> = (0..count).map(|_| pick(rng, WORDS)).collect();
    let mut text = words.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

pub fn uuid<R: Rng>(rng: &mut R) -> String {
    uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid().to_string()
}

pub fn datetime<R: Rng>(rng: &mut R) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(rng.gen_range(DATE_RANGE.0..DATE_RANGE.1), 0)
}

/// A string chosen from the field name, if it suggests one.
pub fn string_for_key<R: Rng>(key: &str, rng: &mut R) -> Option<String> {
    let key = crate::validation::identifiers::normalize_identifier(key);
    let has = |part: &str| key.split('_').any(|segment| segment == part);

    let value = if has("email") || has("mail") {
        email(rng)
    } else if has("uuid") || crate::validation::identifiers::is_id_like(&key) {
        uuid(rng)
    } else if has("username") || has("login") || has("handle") {
        username(rng)
    } else if key == "first_name" || has("firstname") {
        first_name(rng)
    } else if key == "last_name" || has("lastname") || has("surname") {
        last_name(rng)
    } else if has("name") && (has("company") || has("org")) {
        company(rng)
    } else if has("name") || has("author") || has("owner") {
        full_name(rng)
    } else if has("city") || has("town") {
        city(rng)
    } else if has("country") {
        country(rng)
    } else if has("street") || has("address") {
        street(rng)
    } else if has("zip") || has("postal") || has("postcode") {
        postal_code(rng)
    } else if has("phone") || has("mobile") || has("tel") {
        phone(rng)
    } else if has("url") || has("website") || has("link") || has("homepage") {
        url(rng)
    } else if has("company") || has("organization") || has("employer") {
        company(rng)
    } else if has("color") || has("colour") {
        color(rng)
    } else if has("description") || has("bio") || has("summary") || has("comment") {
        sentence(rng)
    } else {
        return None;
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_hints() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(string_for_key("email", &mut rng).unwrap().contains('@'));
        assert!(string_for_key("contactEmail", &mut rng).unwrap().contains('@'));
        assert_eq!(string_for_key("userId", &mut rng).unwrap().len(), 36);
        assert!(string_for_key("homepageUrl", &mut rng).unwrap().starts_with("https://"));
        assert!(CITIES.contains(&string_for_key("city", &mut rng).unwrap().as_str()));
        assert_eq!(string_for_key("quantity", &mut rng), None);
    }

    #[test]
    fn test_sentence_and_datetime() {
        let mut rng = StdRng::seed_from_u64(1);
        let text = sentence(&mut rng);
        assert!(text.ends_with('.'));
        assert!(text.chars().next().unwrap().is_ascii_uppercase());

        let at = datetime(&mut rng).unwrap();
        assert!(at.timestamp() >= DATE_RANGE.0 && at.timestamp() < DATE_RANGE.1);
    }
}
