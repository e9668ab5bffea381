//! Issue Model
//!
//! A single detected writing problem handed to the resolution pipeline by a
//! rule checker, together with the offending sentence and document context.

use serde::{Deserialize, Serialize};

/// Document type used when the caller does not supply one.
pub const DEFAULT_DOCUMENT_TYPE: &str = "general";

/// Classification of a detected writing issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    PassiveVoice,
    LongSentence,
    Wordiness,
    Redundancy,
    Contraction,
    FirstPerson,
    VagueLanguage,
    WeakModifier,
    Nominalization,
    ModalVerb,
    Capitalization,
    Grammar,
    Other,
}

/// Keyword table used to classify free-text feedback. Order matters: the
/// first matching entry wins, so more specific phrases come first.
const FEEDBACK_KEYWORDS: &[(&str, IssueType)] = &[
    ("passive", IssueType::PassiveVoice),
    ("long sentence", IssueType::LongSentence),
    ("sentence is too long", IssueType::LongSentence),
    ("sentence length", IssueType::LongSentence),
    ("too many words", IssueType::LongSentence),
    ("redundan", IssueType::Redundancy),
    ("wordy", IssueType::Wordiness),
    ("wordiness", IssueType::Wordiness),
    ("concise", IssueType::Wordiness),
    ("contraction", IssueType::Contraction),
    ("first person", IssueType::FirstPerson),
    ("first-person", IssueType::FirstPerson),
    ("personal pronoun", IssueType::FirstPerson),
    ("nominaliz", IssueType::Nominalization),
    ("nominalis", IssueType::Nominalization),
    ("intensifier", IssueType::WeakModifier),
    ("weak modifier", IssueType::WeakModifier),
    ("adverb", IssueType::WeakModifier),
    ("modal", IssueType::ModalVerb),
    ("vague", IssueType::VagueLanguage),
    ("ambiguous", IssueType::VagueLanguage),
    ("unclear", IssueType::VagueLanguage),
    ("capitaliz", IssueType::Capitalization),
    ("capitalis", IssueType::Capitalization),
    ("uppercase", IssueType::Capitalization),
    ("grammar", IssueType::Grammar),
    ("agreement", IssueType::Grammar),
    ("spelling", IssueType::Grammar),
];

impl IssueType {
    /// Classify an issue from the free-text feedback a rule checker emitted.
    pub fn from_feedback(feedback: &str) -> Self {
        let lower = feedback.to_lowercase();
        FEEDBACK_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, issue_type)| *issue_type)
            .unwrap_or(IssueType::Other)
    }

    /// Human-readable label used in prompts and guidance text.
    pub fn label(&self) -> &'static str {
        match self {
            IssueType::PassiveVoice => "passive voice",
            IssueType::LongSentence => "long sentence",
            IssueType::Wordiness => "wordiness",
            IssueType::Redundancy => "redundancy",
            IssueType::Contraction => "contraction",
            IssueType::FirstPerson => "first-person language",
            IssueType::VagueLanguage => "vague language",
            IssueType::WeakModifier => "weak modifier",
            IssueType::Nominalization => "nominalization",
            IssueType::ModalVerb => "modal verb usage",
            IssueType::Capitalization => "capitalization",
            IssueType::Grammar => "grammar",
            IssueType::Other => "style issue",
        }
    }

    /// Whether the fix for this issue is usually a small local edit.
    pub fn is_mechanical(&self) -> bool {
        matches!(
            self,
            IssueType::Contraction
                | IssueType::Capitalization
                | IssueType::Wordiness
                | IssueType::Redundancy
                | IssueType::WeakModifier
        )
    }

    /// Whether the fix usually restructures the whole sentence.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            IssueType::LongSentence | IssueType::PassiveVoice | IssueType::Nominalization
        )
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueType::PassiveVoice => "passive_voice",
            IssueType::LongSentence => "long_sentence",
            IssueType::Wordiness => "wordiness",
            IssueType::Redundancy => "redundancy",
            IssueType::Contraction => "contraction",
            IssueType::FirstPerson => "first_person",
            IssueType::VagueLanguage => "vague_language",
            IssueType::WeakModifier => "weak_modifier",
            IssueType::Nominalization => "nominalization",
            IssueType::ModalVerb => "modal_verb",
            IssueType::Capitalization => "capitalization",
            IssueType::Grammar => "grammar",
            IssueType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Immutable input to one resolution call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Feedback text produced by the rule checker
    pub issue_text: String,
    /// The offending sentence
    pub sentence_context: String,
    /// Issue classification
    pub issue_type: IssueType,
    /// Document type (e.g. "general", "technical", "academic")
    #[serde(default = "default_document_type")]
    pub document_type: String,
    /// Writing goals the author selected (e.g. "concise", "formal")
    #[serde(default)]
    pub writing_goals: Vec<String>,
}

fn default_document_type() -> String {
    DEFAULT_DOCUMENT_TYPE.to_string()
}

impl Issue {
    /// Create an issue, classifying its type from the feedback text.
    pub fn new(issue_text: impl Into<String>, sentence_context: impl Into<String>) -> Self {
        let issue_text = issue_text.into();
        let issue_type = IssueType::from_feedback(&issue_text);
        Self {
            issue_text,
            sentence_context: sentence_context.into(),
            issue_type,
            document_type: default_document_type(),
            writing_goals: Vec::new(),
        }
    }

    /// Override the classified issue type.
    pub fn with_issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = issue_type;
        self
    }

    /// Set the document type. Blank values keep the default.
    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        let document_type = document_type.into();
        if !document_type.trim().is_empty() {
            self.document_type = document_type;
        }
        self
    }

    /// Set the writing goals.
    pub fn with_writing_goals(mut self, goals: Vec<String>) -> Self {
        self.writing_goals = goals
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        self
    }

    /// Sentence with surrounding whitespace removed.
    pub fn sentence(&self) -> &str {
        self.sentence_context.trim()
    }

    /// Number of whitespace-separated words in the sentence.
    pub fn word_count(&self) -> usize {
        self.sentence_context.split_whitespace().count()
    }

    /// Whether the formal register applies (contractions are discouraged).
    pub fn is_formal(&self) -> bool {
        let doc = self.document_type.to_lowercase();
        matches!(
            doc.as_str(),
            "technical" | "academic" | "legal" | "formal" | "report" | "business"
        ) || self
            .writing_goals
            .iter()
            .any(|g| g.eq_ignore_ascii_case("formal"))
    }
}
