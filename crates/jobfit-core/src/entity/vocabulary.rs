use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::text::{normalize, NormalizedText};

const DEFAULT_SKILLS: &[&str] = &[
    "python", "java", "javascript", "typescript", "rust", "go", "ruby", "scala",
    "r", "sql", "nosql", "postgresql", "mysql", "mongodb", "excel", "tableau", "power bi",
    "data analysis", "data visualization", "statistics", "machine learning", "deep learning",
    "nlp", "computer vision", "tensorflow", "pytorch", "scikit learn", "pandas", "numpy",
    "spark", "hadoop", "aws", "azure", "gcp", "docker", "kubernetes", "linux", "git",
    "rest", "graphql", "react", "django", "flask", "html", "css", "agile", "scrum",
    "project management", "leadership", "communication", "teamwork", "problem solving",
];

/// Ordered, duplicate-free list of known skill terms, stored normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SkillVocabulary {
    terms: Vec<String>,
}

impl SkillVocabulary {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let terms = terms
            .into_iter()
            .map(|t| normalize(t.as_ref()).into_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        let term = normalize(term);
        self.terms.iter().any(|t| t == term.as_str())
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_SKILLS)
    }
}

impl From<Vec<String>> for SkillVocabulary {
    fn from(terms: Vec<String>) -> Self {
        Self::new(terms)
    }
}

impl From<SkillVocabulary> for Vec<String> {
    fn from(vocabulary: SkillVocabulary) -> Self {
        vocabulary.terms
    }
}

/// Lowercase skill names, iterated in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill: &str) -> bool {
        self.0.insert(skill.to_lowercase())
    }

    #[must_use]
    pub fn contains(&self, skill: &str) -> bool {
        self.0.contains(&skill.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.as_ref().to_lowercase()).collect())
    }
}

/// Vocabulary terms that occur as whole words in a job description.
#[must_use]
pub fn extract_jd_skills(text: &NormalizedText, vocabulary: &SkillVocabulary) -> SkillSet {
    vocabulary
        .terms()
        .filter(|term| text.contains_phrase(term))
        .collect()
}
