//! Fuzzy name comparison
//!
//! Used by the evaluation layer when a case allows fuzzy names. Never applied
//! to extraction output.

use crate::extractors::name::formal_name;

/// Minimum Jaro-Winkler similarity for a fuzzy match
pub const FUZZY_NAME_THRESHOLD: f64 = 0.90;

/// Lowercase, drop apostrophes, turn other punctuation into spaces
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\'' | '’'))
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized tokens with nicknames expanded and sorted
fn canonical_tokens(name: &str) -> Vec<String> {
    let mut tokens: Vec<String> = normalize_name(name)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| formal_name(t).map_or_else(|| t.to_string(), str::to_lowercase))
        .collect();
    tokens.sort();
    tokens
}

/// Exact comparison: trimmed and case-insensitive
pub fn names_match_exact(expected: &str, actual: &str) -> bool {
    expected.trim().to_lowercase() == actual.trim().to_lowercase()
}

/// Similarity between two names (0.0-1.0)
///
/// Case, punctuation and token order are ignored; nicknames compare equal to
/// their formal names.
pub fn name_similarity(expected: &str, actual: &str) -> f64 {
    let a = canonical_tokens(expected);
    let b = canonical_tokens(actual);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    strsim::jaro_winkler(&a.join(" "), &b.join(" "))
}

/// Fuzzy comparison at [`FUZZY_NAME_THRESHOLD`]
pub fn names_match_fuzzy(expected: &str, actual: &str) -> bool {
    name_similarity(expected, actual) >= FUZZY_NAME_THRESHOLD
}
