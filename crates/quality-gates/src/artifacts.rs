//! Meta-Commentary Detection
//!
//! Models often wrap a rewrite in chatter ("Here is the revised sentence:",
//! "I changed the verb to..."). Such output cannot be shown as a suggestion.

use std::sync::LazyLock;

use regex::Regex;

const META_PATTERNS: &[&str] = &[
    r"(?i)^\s*(here\s+is|here's)\b",
    r"(?i)^\s*(sure|certainly|of course|okay|ok)\b[,.!:]",
    r"(?i)\bas an ai\b",
    r"(?i)\blanguage model\b",
    r"(?i)\bi\s*(have|'ve)?\s*(rewritten|revised|changed|replaced|removed|made)\b",
    r"(?i)\b(this|the)\s+(revision|rewrite|revised version|rewritten version|new version)\s+(improves|uses|removes|makes|changes|keeps)\b",
    r"(?i)\bthe (original|revised|rewritten) sentence\b",
    r"(?i)\b(note|explanation|changes made|reasoning)\s*:",
    r"(?i)^\s*(rewritten|revised|improved|corrected|suggested)\s+(sentence|version|text)\b",
    r"(?i)\[(insert|your|placeholder)[^\]]*\]",
    r"\*\*",
];

static META_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    META_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Returns the first meta-commentary fragment found in `text`, if any.
pub fn find_meta_commentary(text: &str) -> Option<String> {
    META_REGEXES
        .iter()
        .find_map(|re| re.find(text).map(|m| m.as_str().trim().to_string()))
}

/// Whether `text` contains meta-commentary.
pub fn has_meta_commentary(text: &str) -> bool {
    find_meta_commentary(text).is_some()
}
