//! Grammar Checking
//!
//! `GrammarChecker` abstracts over whatever grammar tooling is available.
//! `HeuristicGrammarChecker` is a dependency-free fallback that counts a few
//! mechanical problems; it is not a full grammar engine.

use std::sync::LazyLock;

use regex::Regex;

/// Counts grammar issues in a sentence.
pub trait GrammarChecker: Send + Sync {
    /// Number of issues found, or `None` when the checker is unavailable.
    fn count_issues(&self, text: &str) -> Option<usize>;
}

/// Checker that is never available; the grammar check is always skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGrammarChecker;

impl GrammarChecker for NoopGrammarChecker {
    fn count_issues(&self, _text: &str) -> Option<usize> {
        None
    }
}

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[,.;:!?]").unwrap());
static REPEATED_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;:]{2,}|[!?]{2,}|(?:^|[^.])\.\.(?:[^.]|$)").unwrap());
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^.])[.!?]\s+").unwrap());

/// Words starting with a vowel letter that take "a".
const A_EXCEPTIONS: &[&str] = &["uni", "use", "usu", "uti", "eu", "one", "once", "ubiq"];
/// Words starting with a consonant letter that take "an".
const AN_EXCEPTIONS: &[&str] = &["hour", "honest", "honor", "honour", "heir"];

/// Heuristic checker for common mechanical mistakes.
///
/// Counts doubled words, lowercase sentence starts, a/an misuse, spaces
/// before punctuation, repeated punctuation and unbalanced brackets/quotes.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicGrammarChecker;

impl HeuristicGrammarChecker {
    fn doubled_words(words: &[String]) -> usize {
        words
            .windows(2)
            .filter(|pair| pair[0] == pair[1] && pair[0].chars().any(char::is_alphabetic))
            .count()
    }

    fn lowercase_starts(text: &str) -> usize {
        SENTENCE_BREAK
            .split(text)
            .filter_map(|sentence| sentence.chars().find(|c| c.is_alphabetic()))
            .filter(|c| c.is_lowercase())
            .count()
    }

    fn article_misuse(words: &[String]) -> usize {
        words
            .windows(2)
            .filter(|pair| {
                let next = pair[1].as_str();
                let Some(first) = next.chars().next() else {
                    return false;
                };
                if !first.is_alphabetic() {
                    return false;
                }
                let vowel = "aeiou".contains(first);
                match pair[0].as_str() {
                    "a" => vowel && !A_EXCEPTIONS.iter().any(|p| next.starts_with(p)),
                    "an" => !vowel && !AN_EXCEPTIONS.iter().any(|p| next.starts_with(p)),
                    _ => false,
                }
            })
            .count()
    }

    fn regex_hits(re: &Regex, text: &str) -> usize {
        re.find_iter(text).count()
    }

    fn unbalanced(text: &str) -> usize {
        let count = |c: char| text.chars().filter(|&x| x == c).count();
        let mut issues = 0;
        if count('(') != count(')') {
            issues += 1;
        }
        if count('[') != count(']') {
            issues += 1;
        }
        if count('"') % 2 != 0 {
            issues += 1;
        }
        issues
    }
}

impl GrammarChecker for HeuristicGrammarChecker {
    fn count_issues(&self, text: &str) -> Option<usize> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let issues = Self::doubled_words(&words)
            + Self::lowercase_starts(text)
            + Self::article_misuse(&words)
            + Self::regex_hits(&SPACE_BEFORE_PUNCT, text)
            + Self::regex_hits(&REPEATED_PUNCT, text)
            + Self::unbalanced(text);
        Some(issues)
    }
}
