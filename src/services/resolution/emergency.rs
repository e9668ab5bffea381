//! Emergency Generator
//!
//! Last stop of the resolution chain. Pure pattern work: no network, no
//! quota, never fails and never returns empty text.

use std::sync::LazyLock;

use prose_cascade_core::{Confidence, Issue, IssueType, Suggestion, SuggestionMethod};
use regex::Regex;

use super::patterns::{capitalize, contractions, decapitalize, table_for, tidy};

static PASSIVE_BY_AGENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<subj>.+?)\s+(?P<aux>was|were)\s+(?P<verb>[a-z]+)\s+by\s+(?P<agent>[^,.;!?]+?)(?P<rest>\s*[,.;!?].*)?$").unwrap()
});

const IRREGULAR_PARTICIPLES: &[(&str, &str)] = &[
    ("written", "wrote"),
    ("given", "gave"),
    ("taken", "took"),
    ("done", "did"),
    ("seen", "saw"),
    ("made", "made"),
    ("built", "built"),
    ("sent", "sent"),
    ("found", "found"),
    ("known", "knew"),
    ("shown", "showed"),
    ("chosen", "chose"),
    ("driven", "drove"),
    ("eaten", "ate"),
    ("broken", "broke"),
    ("spoken", "spoke"),
    ("stolen", "stole"),
    ("thrown", "threw"),
    ("drawn", "drew"),
    ("begun", "began"),
    ("run", "ran"),
    ("held", "held"),
    ("kept", "kept"),
    ("left", "left"),
    ("lost", "lost"),
    ("paid", "paid"),
    ("read", "read"),
    ("said", "said"),
    ("sold", "sold"),
    ("told", "told"),
    ("thought", "thought"),
    ("brought", "brought"),
    ("bought", "bought"),
    ("caught", "caught"),
    ("taught", "taught"),
    ("won", "won"),
    ("led", "led"),
    ("set", "set"),
    ("put", "put"),
    ("cut", "cut"),
];

const OBJECT_PRONOUNS: &[(&str, &str)] = &[
    ("me", "I"),
    ("us", "we"),
    ("him", "he"),
    ("her", "she"),
    ("them", "they"),
    ("you", "you"),
    ("it", "it"),
];

const SUBJECT_PRONOUNS: &[(&str, &str)] = &[
    ("i", "me"),
    ("we", "us"),
    ("he", "him"),
    ("she", "her"),
    ("they", "them"),
];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "each", "every", "some", "all", "our",
    "their", "its", "my", "your", "his", "her",
];

const JUNCTIONS: &[&str] = &[", and ", ", but ", ", so ", ", yet ", "; "];

/// Minimum words on each side of a split.
const MIN_SPLIT_WORDS: usize = 3;

/// Pattern-based fallback generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmergencyGenerator;

impl EmergencyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce a suggestion for `sentence`. Medium confidence when a
    /// transformation applied, low when only guidance could be attached.
    pub fn generate(&self, issue_type: IssueType, sentence: &str) -> Suggestion {
        let sentence = sentence.trim();
        let hint = guidance_for(issue_type);

        if sentence.is_empty() {
            return Suggestion::guidance_only(hint, sentence, SuggestionMethod::Emergency, hint);
        }

        match transform(issue_type, sentence) {
            Some(text) if text != sentence => {
                tracing::debug!("Emergency transform applied for {}", issue_type);
                Suggestion::rewrite(text, sentence, SuggestionMethod::Emergency, Confidence::Medium)
                    .with_guidance(hint)
            }
            _ => Suggestion::guidance_only(
                format!("{} [Consider: {}]", sentence, hint),
                sentence,
                SuggestionMethod::Emergency,
                hint,
            ),
        }
    }

    /// Convenience wrapper over [`Self::generate`] for an issue.
    pub fn generate_for(&self, issue: &Issue) -> Suggestion {
        self.generate(issue.issue_type, issue.sentence())
    }
}

fn transform(issue_type: IssueType, sentence: &str) -> Option<String> {
    match issue_type {
        IssueType::PassiveVoice => passive_to_active(sentence),
        IssueType::LongSentence => split_long_sentence(sentence),
        IssueType::Contraction => contractions().apply(sentence),
        other => table_for(other).and_then(|table| table.apply(sentence)),
    }
}

/// Issue-specific advice shown alongside (or instead of) a rewrite.
pub fn guidance_for(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::PassiveVoice => {
            "Use active voice: make the actor the subject of the sentence."
        }
        IssueType::LongSentence => {
            "Split the sentence into shorter ones, one idea per sentence."
        }
        IssueType::Wordiness => "Replace wordy phrases with shorter equivalents.",
        IssueType::Redundancy => "Remove words that repeat what is already said.",
        IssueType::Contraction => "Spell out contractions in formal writing.",
        IssueType::FirstPerson => {
            "State the point directly instead of framing it as a personal opinion."
        }
        IssueType::VagueLanguage => "Replace vague words with specific, measurable terms.",
        IssueType::WeakModifier => "Drop intensifiers such as \"very\" or use a stronger word.",
        IssueType::Nominalization => "Turn noun phrases like \"make a decision\" into verbs.",
        IssueType::ModalVerb => "Use direct statements instead of modal verbs where possible.",
        IssueType::Capitalization => "Capitalize sentence starts, proper nouns and \"I\".",
        IssueType::Grammar => "Check agreement, articles and punctuation in this sentence.",
        IssueType::Other => "Revise the sentence for clarity and concision.",
    }
}

/// `<subj> was|were <participle> by <agent><rest>` → `<Agent> <past> <subj><rest>`.
pub fn passive_to_active(sentence: &str) -> Option<String> {
    let caps = PASSIVE_BY_AGENT.captures(sentence)?;
    let subject = caps.name("subj")?.as_str().trim();
    let verb = caps.name("verb")?.as_str().to_lowercase();
    let agent = caps.name("agent")?.as_str().trim();
    let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");

    let past = past_tense(&verb)?;
    if subject.is_empty() || agent.is_empty() {
        return None;
    }

    let new_subject = capitalize(&agent_as_subject(agent));
    let new_object = subject_as_object(subject);
    Some(tidy(&format!("{} {} {}{}", new_subject, past, new_object, rest)))
}

/// Simple past for a passive participle. Regular `-ed` forms are identical.
fn past_tense(participle: &str) -> Option<String> {
    if let Some((_, past)) = IRREGULAR_PARTICIPLES
        .iter()
        .find(|(p, _)| *p == participle)
    {
        return Some((*past).to_string());
    }
    if participle.len() > 3 && participle.ends_with("ed") {
        return Some(participle.to_string());
    }
    None
}

fn agent_as_subject(agent: &str) -> String {
    let lower = agent.to_lowercase();
    OBJECT_PRONOUNS
        .iter()
        .find(|(object, _)| *object == lower)
        .map(|(_, subject)| (*subject).to_string())
        .unwrap_or_else(|| agent.to_string())
}

fn subject_as_object(subject: &str) -> String {
    let lower = subject.to_lowercase();
    if let Some((_, object)) = SUBJECT_PRONOUNS.iter().find(|(s, _)| *s == lower) {
        return (*object).to_string();
    }
    let first_word = lower.split_whitespace().next().unwrap_or("");
    if DETERMINERS.contains(&first_word) {
        decapitalize(subject)
    } else {
        subject.to_string()
    }
}

/// Split at the coordinating junction closest to the middle of the sentence.
pub fn split_long_sentence(sentence: &str) -> Option<String> {
    let middle = sentence.len() / 2;
    let (pos, junction) = JUNCTIONS
        .iter()
        .flat_map(|junction| {
            sentence
                .match_indices(junction)
                .map(move |(pos, _)| (pos, *junction))
        })
        .filter(|(pos, junction)| {
            let left = &sentence[..*pos];
            let right = &sentence[pos + junction.len()..];
            left.split_whitespace().count() >= MIN_SPLIT_WORDS
                && right.split_whitespace().count() >= MIN_SPLIT_WORDS
        })
        .min_by_key(|(pos, _)| pos.abs_diff(middle))?;

    let left = sentence[..pos].trim_end();
    let right = sentence[pos + junction.len()..].trim_start();

    let connector = junction.trim_matches(|c: char| c == ',' || c == ';' || c == ' ');
    let right = match connector {
        "but" => format!("However, {}", right),
        "so" => format!("As a result, {}", right),
        "yet" => format!("Still, {}", right),
        _ => capitalize(right),
    };

    let left = left.trim_end_matches([',', ';']);
    Some(format!("{}. {}", capitalize(left), right))
}
