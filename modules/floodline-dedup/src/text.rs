//! Free-text similarity.

use strsim::normalized_levenshtein;

/// Texts shorter than this (in characters, after normalization) are not
/// compared; edit-distance ratios on short strings swing too widely.
pub const MIN_TEXT_CHARS: usize = 10;

/// Location descriptions at or above this similarity count as the same place.
const LOCATION_TEXT_SIMILARITY: f64 = 0.9;

/// Lowercase, trim, and collapse internal whitespace runs.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `1 - lev(a, b) / max(len(a), len(b))` over normalized text, in characters.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&normalize_text(a), &normalize_text(b))
}

/// Similarity if both texts are long enough to compare, else `None`.
pub fn comparable_similarity(a: &str, b: &str) -> Option<f64> {
    let a = normalize_text(a);
    let b = normalize_text(b);
    if a.chars().count() < MIN_TEXT_CHARS || b.chars().count() < MIN_TEXT_CHARS {
        return None;
    }
    Some(normalized_levenshtein(&a, &b))
}

/// Near-equality of two free-text location descriptions.
pub fn location_text_matches(a: &str, b: &str) -> bool {
    let a = normalize_text(a);
    let b = normalize_text(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || normalized_levenshtein(&a, &b) >= LOCATION_TEXT_SIMILARITY
}
