// ABOUTME: Feature detection over the raw text of a loaded deck
// ABOUTME: Flags optional renderer features (math, editors, tweets, diagrams) the deck uses

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static INLINE_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$.*?\$").unwrap());
static MONACO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{monaco.*\}").unwrap());
static TWEET: Lazy<Regex> = Lazy::new(|| Regex::new(r"<Tweet\b").unwrap());
static MERMAID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^```mermaid").unwrap());

/// Optional features referenced by a deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSet {
    pub katex: bool,
    pub monaco: bool,
    pub tweet: bool,
    pub mermaid: bool,
}

pub fn detect_features(code: &str) -> FeatureSet {
    FeatureSet {
        katex: INLINE_MATH.is_match(code) || code.contains("$$"),
        monaco: MONACO.is_match(code),
        tweet: TWEET.is_match(code),
        mermaid: MERMAID.is_match(code),
    }
}
