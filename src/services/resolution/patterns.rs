//! Phrase Substitution Tables
//!
//! Case-insensitive whole-phrase replacements shared by the rule-based
//! rewriter and the emergency generator.

use std::sync::LazyLock;

use prose_cascade_core::IssueType;
use regex::{Captures, Regex};

/// A compiled set of phrase replacements applied in order.
pub struct PhraseTable {
    rules: Vec<(Regex, &'static str)>,
}

impl PhraseTable {
    /// Compile `(phrase, replacement)` pairs. Apostrophes in phrases also
    /// match typographic apostrophes.
    pub fn new(pairs: &[(&'static str, &'static str)]) -> Self {
        let rules = pairs
            .iter()
            .map(|(phrase, replacement)| {
                let escaped = regex::escape(phrase).replace('\'', "['\u{2019}]");
                let pattern = if replacement.is_empty() {
                    format!(r"(?i)\b{}\b,?\s*", escaped)
                } else {
                    format!(r"(?i)\b{}\b", escaped)
                };
                (Regex::new(&pattern).unwrap(), *replacement)
            })
            .collect();
        Self { rules }
    }

    /// Apply every rule. Returns `None` when nothing matched.
    pub fn apply(&self, text: &str) -> Option<String> {
        let mut out = text.to_string();
        let mut changed = false;
        for (re, replacement) in &self.rules {
            if !re.is_match(&out) {
                continue;
            }
            changed = true;
            out = re
                .replace_all(&out, |caps: &Captures| match_case(&caps[0], replacement))
                .into_owned();
        }
        changed.then(|| tidy(&out))
    }
}

/// Carry the capitalization of the matched text over to the replacement.
fn match_case(matched: &str, replacement: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    if starts_upper {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

/// Uppercase the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Lowercase the first character.
pub fn decapitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").unwrap());

/// Collapse doubled spaces, remove spaces before punctuation, capitalize
/// the sentence start.
pub fn tidy(text: &str) -> String {
    let out = SPACE_RUNS.replace_all(text.trim(), " ");
    let out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1");
    capitalize(&out)
}

const WORDINESS: &[(&str, &str)] = &[
    ("it is important to note that", ""),
    ("it should be noted that", ""),
    ("due to the fact that", "because"),
    ("in spite of the fact that", "although"),
    ("at this point in time", "now"),
    ("at the present time", "now"),
    ("in the event that", "if"),
    ("for the purpose of", "to"),
    ("in order to", "to"),
    ("with regard to", "about"),
    ("with respect to", "about"),
    ("has the ability to", "can"),
    ("is able to", "can"),
    ("are able to", "can"),
    ("a large number of", "many"),
    ("a majority of", "most"),
    ("in the near future", "soon"),
    ("prior to", "before"),
    ("subsequent to", "after"),
    ("in close proximity to", "near"),
];

const REDUNDANCY: &[(&str, &str)] = &[
    ("absolutely essential", "essential"),
    ("advance planning", "planning"),
    ("basic fundamentals", "fundamentals"),
    ("close proximity", "proximity"),
    ("completely eliminate", "eliminate"),
    ("combine together", "combine"),
    ("each and every", "every"),
    ("end result", "result"),
    ("final outcome", "outcome"),
    ("first and foremost", "first"),
    ("free gift", "gift"),
    ("future plans", "plans"),
    ("past history", "history"),
    ("repeat again", "repeat"),
    ("revert back", "revert"),
    ("unexpected surprise", "surprise"),
    ("new innovation", "innovation"),
    ("join together", "join"),
];

const NOMINALIZATION: &[(&str, &str)] = &[
    ("make a decision", "decide"),
    ("made a decision", "decided"),
    ("come to a conclusion", "conclude"),
    ("came to a conclusion", "concluded"),
    ("perform an analysis of", "analyze"),
    ("performed an analysis of", "analyzed"),
    ("conduct an investigation into", "investigate"),
    ("conducted an investigation into", "investigated"),
    ("give consideration to", "consider"),
    ("take into consideration", "consider"),
    ("make an assumption", "assume"),
    ("provide assistance to", "assist"),
    ("reach an agreement", "agree"),
    ("make a recommendation", "recommend"),
    ("have a discussion about", "discuss"),
    ("is in compliance with", "complies with"),
];

const WEAK_MODIFIERS: &[(&str, &str)] = &[
    ("very", ""),
    ("really", ""),
    ("quite", ""),
    ("extremely", ""),
    ("basically", ""),
    ("actually", ""),
    ("totally", ""),
    ("somewhat", ""),
    ("fairly", ""),
];

const FIRST_PERSON_HEDGES: &[(&str, &str)] = &[
    ("in my opinion", ""),
    ("in my view", ""),
    ("i think that", ""),
    ("i believe that", ""),
    ("i feel that", ""),
    ("i think", ""),
    ("i believe", ""),
];

const CONTRACTIONS: &[(&str, &str)] = &[
    ("can't", "cannot"),
    ("won't", "will not"),
    ("shan't", "shall not"),
    ("don't", "do not"),
    ("doesn't", "does not"),
    ("didn't", "did not"),
    ("isn't", "is not"),
    ("aren't", "are not"),
    ("wasn't", "was not"),
    ("weren't", "were not"),
    ("haven't", "have not"),
    ("hasn't", "has not"),
    ("hadn't", "had not"),
    ("shouldn't", "should not"),
    ("wouldn't", "would not"),
    ("couldn't", "could not"),
    ("mustn't", "must not"),
    ("it's", "it is"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("what's", "what is"),
    ("let's", "let us"),
    ("i'm", "I am"),
    ("we're", "we are"),
    ("they're", "they are"),
    ("you're", "you are"),
    ("we've", "we have"),
    ("they've", "they have"),
    ("you've", "you have"),
    ("i've", "I have"),
    ("we'll", "we will"),
    ("they'll", "they will"),
    ("you'll", "you will"),
    ("i'll", "I will"),
];

static WORDINESS_TABLE: LazyLock<PhraseTable> = LazyLock::new(|| PhraseTable::new(WORDINESS));
static REDUNDANCY_TABLE: LazyLock<PhraseTable> = LazyLock::new(|| PhraseTable::new(REDUNDANCY));
static NOMINALIZATION_TABLE: LazyLock<PhraseTable> =
    LazyLock::new(|| PhraseTable::new(NOMINALIZATION));
static WEAK_MODIFIER_TABLE: LazyLock<PhraseTable> =
    LazyLock::new(|| PhraseTable::new(WEAK_MODIFIERS));
static FIRST_PERSON_TABLE: LazyLock<PhraseTable> =
    LazyLock::new(|| PhraseTable::new(FIRST_PERSON_HEDGES));
static CONTRACTION_TABLE: LazyLock<PhraseTable> = LazyLock::new(|| PhraseTable::new(CONTRACTIONS));

/// Phrase table for an issue type, if one exists.
pub fn table_for(issue_type: IssueType) -> Option<&'static PhraseTable> {
    match issue_type {
        IssueType::Wordiness => Some(&*WORDINESS_TABLE),
        IssueType::Redundancy => Some(&*REDUNDANCY_TABLE),
        IssueType::Nominalization => Some(&*NOMINALIZATION_TABLE),
        IssueType::WeakModifier => Some(&*WEAK_MODIFIER_TABLE),
        IssueType::FirstPerson => Some(&*FIRST_PERSON_TABLE),
        IssueType::Contraction => Some(&*CONTRACTION_TABLE),
        _ => None,
    }
}

/// Contraction expansion table.
pub fn contractions() -> &'static PhraseTable {
    &*CONTRACTION_TABLE
}
