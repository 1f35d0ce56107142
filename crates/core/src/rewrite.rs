//! Rule-based rewriting of AI-flagged slide text.
//!
//! Wordy stock phrases are swapped for plain ones, then a few regex cleanups
//! tidy doubled words and a narrow passive-voice pattern.

use regex::{NoExpand, Regex};
use std::sync::LazyLock;

/// Phrase substitutions, applied top to bottom.
///
/// Order matters: an entry may rewrite text that a later entry would
/// otherwise match, so the list is a priority order.
const PHRASE_TABLE: &[(&str, &str)] = &[
    ("utilize", "use"),
    ("in order to", "to"),
    ("due to the fact that", "because"),
    ("at this point in time", "now"),
    ("in the event that", "if"),
    ("for the purpose of", "to"),
    ("prior to", "before"),
    ("subsequent to", "after"),
    ("in close proximity to", "near"),
    ("is able to", "can"),
    ("has the ability to", "can"),
    ("in spite of", "despite"),
    ("on a regular basis", "regularly"),
    ("in the near future", "soon"),
    ("at the present time", "currently"),
    ("make a decision", "decide"),
    ("give consideration to", "consider"),
    ("make an assumption", "assume"),
    ("conduct an investigation", "investigate"),
    ("perform an analysis", "analyze"),
];

/// Case-insensitive literal matchers for `PHRASE_TABLE`, same order.
static PHRASE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PHRASE_TABLE
        .iter()
        .map(|(phrase, replacement)| {
            let pattern = format!("(?i){}", regex::escape(phrase));
            (Regex::new(&pattern).unwrap(), *replacement)
        })
        .collect()
});

static DOUBLED_THAT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bthat\s+that\b").unwrap());

static PASSIVE_IS_BEING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bis being\s+(\w+ed)\b").unwrap());

static DOUBLED_VERY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bvery\s+very\b").unwrap());

/// Marker appended by [`ContentRewriter::rewrite_with_note`].
pub const REWRITE_NOTE: &str = "[Note: Content simplified for clarity]";

/// Deterministic, stateless rewriter for text flagged as AI-generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRewriter;

impl ContentRewriter {
    /// Create a new rewriter.
    pub fn new() -> Self {
        Self
    }

    /// Rewrite text with the phrase table followed by the cleanup patterns.
    pub fn rewrite(&self, text: &str) -> String {
        log::debug!("Rewriting text of length {}", text.len());

        let mut output = text.to_string();

        for (pattern, replacement) in PHRASE_PATTERNS.iter() {
            if pattern.is_match(&output) {
                output = pattern.replace_all(&output, NoExpand(replacement)).into_owned();
            }
        }

        let output = simplify_sentences(&output);

        log::debug!("Rewritten text has length {}", output.len());
        output
    }

    /// Rewrite and append a note saying the content was simplified.
    pub fn rewrite_with_note(&self, text: &str) -> String {
        format!("{}\n{}", self.rewrite(text), REWRITE_NOTE)
    }
}

/// Collapse doubled "that"/"very" and shorten "is being <verb>ed".
fn simplify_sentences(text: &str) -> String {
    let text = DOUBLED_THAT_REGEX.replace_all(text, "that");
    let text = PASSIVE_IS_BEING_REGEX.replace_all(&text, "is $1");
    let text = DOUBLED_VERY_REGEX.replace_all(&text, "very");
    text.into_owned()
}
