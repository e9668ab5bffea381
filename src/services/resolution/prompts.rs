//! Rewrite Prompts
//!
//! Prompt construction for the model tiers and cleanup of raw model output
//! before it reaches the quality gate.

use std::fmt::Write as _;
use std::sync::LazyLock;

use prose_cascade_core::{Issue, KnowledgeChunk};
use prose_cascade_llm::GenerateRequest;
use regex::Regex;

/// System prompt shared by both model tiers.
pub const SYSTEM_PROMPT: &str = "You are an editor. Rewrite the sentence you are given so that \
it fixes the reported writing issue while keeping its meaning. Reply with the rewritten \
sentence only: no explanation, no quotes, no labels.";

/// Longest guidance passage included in a prompt, in characters.
const MAX_CHUNK_CHARS: usize = 600;

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*```[a-zA-Z]*\s*$").unwrap());
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:rewritten|revised|improved|corrected|suggested|new)\s+(?:sentence|version|text)|answer|output|rewrite)\s*:\s*",
    )
    .unwrap()
});
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

fn write_issue_block(prompt: &mut String, issue: &Issue) {
    let _ = writeln!(prompt, "Issue type: {}", issue.issue_type.label());
    let _ = writeln!(prompt, "Feedback: {}", issue.issue_text.trim());
    let _ = writeln!(prompt, "Document type: {}", issue.document_type);
    if !issue.writing_goals.is_empty() {
        let _ = writeln!(prompt, "Writing goals: {}", issue.writing_goals.join(", "));
    }
    if issue.is_formal() {
        prompt.push_str("Use a formal register without contractions.\n");
    }
}

/// Prompt grounded in retrieved style guidance.
pub fn knowledge_prompt(issue: &Issue, chunks: &[KnowledgeChunk]) -> GenerateRequest {
    let mut prompt = String::from("Style guidance:\n");
    for (i, chunk) in chunks.iter().enumerate() {
        let text: String = chunk.text.trim().chars().take(MAX_CHUNK_CHARS).collect();
        let _ = writeln!(prompt, "[{}] {}", i + 1, text);
    }
    prompt.push('\n');
    write_issue_block(&mut prompt, issue);
    let _ = write!(
        prompt,
        "\nFollowing the guidance above, rewrite this sentence:\n{}",
        issue.sentence()
    );
    GenerateRequest::new(prompt).with_system(SYSTEM_PROMPT)
}

/// Prompt without retrieved guidance.
pub fn model_only_prompt(issue: &Issue) -> GenerateRequest {
    let mut prompt = String::new();
    write_issue_block(&mut prompt, issue);
    let _ = write!(prompt, "\nRewrite this sentence:\n{}", issue.sentence());
    GenerateRequest::new(prompt).with_system(SYSTEM_PROMPT)
}

/// Reduce raw model output to the candidate sentence.
///
/// Strips code fences, keeps the first non-empty paragraph (joined onto one
/// line), removes a leading label and surrounding quotes.
pub fn clean_model_output(raw: &str) -> String {
    let without_fences = FENCE.replace_all(raw, "");

    let mut candidate = String::new();
    for paragraph in PARAGRAPH_BREAK.split(&without_fences) {
        let joined = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        let stripped = LEADING_LABEL.replace(&joined, "").into_owned();
        if !stripped.trim().is_empty() {
            candidate = stripped;
            break;
        }
    }

    strip_quotes(candidate.trim()).trim().to_string()
}

fn strip_quotes(text: &str) -> &str {
    const PAIRS: &[(char, char)] = &[('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}'), ('`', '`')];
    for (open, close) in PAIRS {
        if text.chars().count() >= 2 && text.starts_with(*open) && text.ends_with(*close) {
            return &text[open.len_utf8()..text.len() - close.len_utf8()];
        }
    }
    text
}
