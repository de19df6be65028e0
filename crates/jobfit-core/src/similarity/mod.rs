mod lexical;
mod semantic;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::text::NormalizedText;

pub use lexical::{score_lexical, LexicalScorer, TfIdfVectors};
#[cfg(feature = "bert")]
pub use semantic::BertSentenceEncoder;
pub use semantic::{score_semantic, SemanticScorer, SentenceEncoder};

/// Similarity on a 0–100 scale, rounded to two decimals. Only comparable with
/// scores produced by the same [`ScoringMethod`].
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchScore(f64);

impl MatchScore {
    pub const ZERO: Self = Self(0.0);

    /// Scales a cosine similarity to 0–100. Negative and non-finite values
    /// become 0.
    #[must_use]
    pub fn from_cosine(cosine: f64) -> Self {
        if !cosine.is_finite() {
            return Self::ZERO;
        }
        let percent = (cosine * 100.0).clamp(0.0, 100.0);
        Self((percent * 100.0).round() / 100.0)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for MatchScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    #[default]
    Lexical,
    Semantic,
}

impl ScoringMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lexical" | "tfidf" | "tf-idf" => Ok(Self::Lexical),
            "semantic" | "bert" | "embedding" => Ok(Self::Semantic),
            _ => Err(Error::Config(format!("unknown scoring method: {s}"))),
        }
    }
}

pub trait SimilarityScorer: Send + Sync {
    fn method(&self) -> ScoringMethod;

    fn score(&self, resume: &NormalizedText, job: &NormalizedText) -> Result<MatchScore>;
}

/// Cosine of two dense vectors; 0 when either has zero norm or the lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
