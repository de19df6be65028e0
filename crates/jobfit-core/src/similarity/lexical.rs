use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{MatchScore, ScoringMethod, SimilarityScorer};
use crate::error::Result;
use crate::text::{is_stopword, NormalizedText};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|t| !is_stopword(t))
}

/// TF-IDF vectors fitted on exactly one resume and one job description.
///
/// The document frequency only ever sees these two texts, so a term shared
/// by both gets the minimum weight regardless of how distinctive it is in
/// general. Scores are comparable within a batch run, not as absolute values.
#[derive(Debug, Clone)]
pub struct TfIdfVectors {
    terms: Vec<String>,
    resume: Vec<f64>,
    job: Vec<f64>,
}

impl TfIdfVectors {
    const DOCUMENTS: f64 = 2.0;

    #[must_use]
    pub fn fit(resume: &str, job: &str) -> Self {
        let mut counts: BTreeMap<&str, [u32; 2]> = BTreeMap::new();
        for token in tokenize(resume) {
            counts.entry(token).or_default()[0] += 1;
        }
        for token in tokenize(job) {
            counts.entry(token).or_default()[1] += 1;
        }

        let mut terms = Vec::with_capacity(counts.len());
        let mut resume_weights = Vec::with_capacity(counts.len());
        let mut job_weights = Vec::with_capacity(counts.len());

        for (term, [in_resume, in_job]) in counts {
            let df = f64::from(u8::from(in_resume > 0) + u8::from(in_job > 0));
            let idf = ((1.0 + Self::DOCUMENTS) / (1.0 + df)).ln() + 1.0;
            terms.push(term.to_string());
            resume_weights.push(f64::from(in_resume) * idf);
            job_weights.push(f64::from(in_job) * idf);
        }

        l2_normalize(&mut resume_weights);
        l2_normalize(&mut job_weights);

        Self {
            terms,
            resume: resume_weights,
            job: job_weights,
        }
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Dot product of the two unit vectors; 0 when either side has no terms.
    #[must_use]
    pub fn cosine(&self) -> f64 {
        self.resume
            .iter()
            .zip(&self.job)
            .map(|(a, b)| a * b)
            .sum()
    }
}

fn l2_normalize(weights: &mut [f64]) {
    let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for w in weights.iter_mut() {
            *w /= norm;
        }
    }
}

#[must_use]
pub fn score_lexical(resume: &NormalizedText, job: &NormalizedText) -> MatchScore {
    let vectors = TfIdfVectors::fit(resume.as_str(), job.as_str());
    if vectors.is_empty() {
        tracing::debug!("No scorable terms in either text, lexical score is 0");
        return MatchScore::ZERO;
    }
    MatchScore::from_cosine(vectors.cosine())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl SimilarityScorer for LexicalScorer {
    fn method(&self) -> ScoringMethod {
        ScoringMethod::Lexical
    }

    fn score(&self, resume: &NormalizedText, job: &NormalizedText) -> Result<MatchScore> {
        Ok(score_lexical(resume, job))
    }
}
