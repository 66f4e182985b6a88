//! Text normalization for name-like and key-like columns

use super::rules::NamePolicy;
use regex::Regex;
use std::sync::LazyLock;

/// Placeholder for name-like values that cannot be read as a label
pub const SENTINEL: &str = "Unknown";

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").expect("numeric pattern is valid"));

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("non-word pattern is valid"));

/// Normalize an already trimmed name-like value
pub fn normalize_name(value: &str, policy: NamePolicy) -> String {
    match policy {
        NamePolicy::Sentinel if is_unreadable(value) => SENTINEL.to_string(),
        NamePolicy::Sentinel | NamePolicy::TitleCase => title_case(value),
    }
}

/// Empty, purely numeric, or containing symbols outside words and whitespace
fn is_unreadable(value: &str) -> bool {
    value.is_empty() || NUMERIC.is_match(value) || NON_WORD.is_match(value)
}

/// Upper-case the first letter of every word and lower-case the rest
///
/// A word starts at any letter not preceded by another letter, so
/// `"JUAN perez"` becomes `"Juan Perez"` and `"o'neil"` becomes `"O'Neil"`.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut previous_is_letter = false;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                result.extend(ch.to_lowercase());
            } else {
                // Only the first char of a multi-char mapping stays upper case
                let mut upper = ch.to_uppercase();
                result.extend(upper.next());
                result.extend(upper.flat_map(char::to_lowercase));
            }
            previous_is_letter = true;
        } else {
            result.push(ch);
            previous_is_letter = false;
        }
    }

    result
}
