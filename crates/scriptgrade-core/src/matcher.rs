//! Text normalization and lexical keyword matching.
//!
//! A keyword matches when its normalized form appears as a contiguous
//! substring of the normalized answer text. No stemming, no fuzzy
//! matching: a keyword either fully appears or it does not.

use crate::model::MatchResult;

/// Fold text for comparison: lowercase, replace punctuation with spaces,
/// collapse runs of whitespace to single spaces.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            folded.extend(c.to_lowercase());
        } else {
            folded.push(' ');
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of tokens in the normalized form of `text`.
pub fn token_count(text: &str) -> usize {
    normalize(text).split_whitespace().count()
}

/// Match `keywords` against `student_text`.
///
/// Output lists preserve rubric order, and together they cover the
/// keyword set exactly once. An empty answer leaves every keyword
/// unmatched, as does a keyword that normalizes to the empty string.
pub fn match_keywords(student_text: &str, keywords: &[String]) -> MatchResult {
    let haystack = normalize(student_text);
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for keyword in keywords {
        let needle = normalize(keyword);
        if !needle.is_empty() && haystack.contains(&needle) {
            matched.push(keyword.clone());
        } else {
            unmatched.push(keyword.clone());
        }
    }

    MatchResult { matched, unmatched }
}
