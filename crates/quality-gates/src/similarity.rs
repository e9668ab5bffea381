//! Token Similarity
//!
//! Diff-based similarity between two sentences. `token_similarity` works on
//! normalized words and measures whether meaning survived;
//! `surface_similarity` keeps case and punctuation and measures whether
//! anything was edited at all.

use similar::TextDiff;

/// Lowercase word tokens with surrounding punctuation removed.
///
/// Apostrophes inside words are kept ("don't" stays one token).
pub fn normalize_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Similarity ratio in `[0, 1]` between two texts.
///
/// `1.0` means the normalized token sequences are identical.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let a_tokens = normalize_tokens(a);
    let b_tokens = normalize_tokens(b);
    if a_tokens.is_empty() && b_tokens.is_empty() {
        return 1.0;
    }
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }

    let a_refs: Vec<&str> = a_tokens.iter().map(String::as_str).collect();
    let b_refs: Vec<&str> = b_tokens.iter().map(String::as_str).collect();
    ratio(&a_refs, &b_refs)
}

/// Similarity ratio in `[0, 1]` over whitespace-separated tokens as written.
///
/// `1.0` only when both texts have the same words, case and punctuation.
pub fn surface_similarity(a: &str, b: &str) -> f64 {
    let a_tokens: Vec<&str> = a.split_whitespace().collect();
    let b_tokens: Vec<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() && b_tokens.is_empty() {
        return 1.0;
    }
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    ratio(&a_tokens, &b_tokens)
}

fn ratio(a: &[&str], b: &[&str]) -> f64 {
    f64::from(TextDiff::from_slices(a, b).ratio())
}
