use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Lowercase substrings marking administrative text rather than subjects.
pub const IGNORE_KEYWORDS: &[&str] = &[
    "institute",
    "time table",
    "session",
    "semester",
    "branch",
    "section",
    "break",
    "first half",
    "second half",
    "mr.",
    "ms.",
    "dr.",
];

fn time_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}[:.]\d{2}").expect("static regex"))
}

fn room_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(CR-|Hall|Lab|Auditorium)").expect("static regex"))
}

/// True when a slash-separated sub-value is obviously not a subject.
pub fn is_noise(value: &str) -> bool {
    let lower = value.to_lowercase();
    value.chars().count() < 2
        || (time_pattern().is_match(value) && value.contains('-'))
        || room_pattern().is_match(value)
        || IGNORE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Splits raw values on `/`, drops noise, returns the survivors deduplicated
/// and sorted.
pub fn pre_clean_values<'a, I>(raw_values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut cleaned: BTreeSet<String> = BTreeSet::new();
    for raw in raw_values {
        for part in raw.split('/') {
            let v = part.trim();
            if !is_noise(v) {
                cleaned.insert(v.to_string());
            }
        }
    }
    cleaned.into_iter().collect()
}
