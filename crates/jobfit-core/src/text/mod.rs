mod stopwords;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use stopwords::{is_stopword, ENGLISH_STOP_WORDS};

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Text that has been through [`normalize`]: lowercase, punctuation replaced
/// by spaces, single spaces between words, no leading or trailing space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalizedText(String);

impl NormalizedText {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|w| !w.is_empty())
    }

    /// Whole-word containment of an already normalized phrase.
    #[must_use]
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        if phrase.is_empty() || self.0.is_empty() {
            return false;
        }
        format!(" {} ", self.0).contains(&format!(" {phrase} "))
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for NormalizedText {
    fn from(raw: String) -> Self {
        normalize(&raw)
    }
}

impl From<NormalizedText> for String {
    fn from(text: NormalizedText) -> Self {
        text.0
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes resume and job description text before extraction and scoring.
#[must_use]
pub fn normalize(raw: &str) -> NormalizedText {
    let stripped = NON_WORD.replace_all(raw, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    NormalizedText(collapsed.trim().to_lowercase())
}
