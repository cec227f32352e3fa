//! Term normalization for scoring.
//!
//! Lowercases text, turns every character that is not a letter, digit or
//! whitespace into a space, splits on whitespace, and drops one-character
//! terms and English stop words. Order and duplicates are preserved because
//! the scorer counts term frequencies.
//!
//! # Example
//!
//! ```rust
//! use docchat_core::tokenize::tokenize;
//!
//! assert_eq!(tokenize("Cats often sleep during the day!"), vec!["cats", "often", "sleep", "during", "day"]);
//! assert!(tokenize("The a an").is_empty());
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

/// Closed list of function words that never become terms.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
        "did", "will", "would", "could", "should", "may", "might", "must", "can", "this", "that",
        "these", "those",
    ]
    .into_iter()
    .collect()
});

/// Returns true if `term` is in the stop word list. `term` must be lowercase.
pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(term)
}

/// Tokenize `text` into index terms.
///
/// Empty input, or input made only of punctuation, single characters and
/// stop words, yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    normalized
        .split_whitespace()
        .filter(|term| term.chars().count() > 1)
        .filter(|term| !is_stop_word(term))
        .map(str::to_string)
        .collect()
}
