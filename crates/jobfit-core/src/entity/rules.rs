use regex::Regex;

use super::{EntityRecognizer, RecognizedEntity, RecognizerStrategy, SkillVocabulary};
use crate::error::{Error, Result};
use crate::text::normalize;

const DEFAULT_LOCATIONS: &[&str] = &[
    "new york", "san francisco", "seattle", "boston", "chicago", "austin", "los angeles",
    "toronto", "vancouver", "london", "manchester", "dublin", "berlin", "munich", "paris",
    "amsterdam", "madrid", "stockholm", "zurich", "bangalore", "bengaluru", "mumbai", "delhi",
    "hyderabad", "singapore", "tokyo", "sydney", "melbourne", "remote", "usa",
    "united states", "canada", "united kingdom", "germany", "france", "india", "australia",
];

pub struct EntityPattern {
    pub label: String,
    pub regex: Regex,
}

impl EntityPattern {
    pub fn new(label: &str, pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            label: label.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    /// Whole-word alternation over already normalized terms, longest first.
    pub fn gazetteer<'a, I>(label: &str, terms: I) -> std::result::Result<Option<Self>, regex::Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut terms: Vec<&str> = terms.into_iter().filter(|t| !t.is_empty()).collect();
        if terms.is_empty() {
            return Ok(None);
        }
        terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        Self::new(label, &format!(r"\b(?:{alternation})\b")).map(Some)
    }
}

/// Gazetteer and pattern based recognizer for normalized resume text.
///
/// Emits `SKILL` for vocabulary terms, `EXPERIENCE` for durations such as
/// "5 years", `DATE` for years and month-year mentions, and `GPE` for
/// gazetteer locations.
pub struct RuleBasedRecognizer {
    patterns: Vec<EntityPattern>,
}

impl RuleBasedRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: EntityPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn with_default_patterns(
        vocabulary: &SkillVocabulary,
        locations: &[String],
    ) -> Result<Self> {
        let build = |e: regex::Error| Error::Config(format!("invalid entity pattern: {e}"));
        let mut recognizer = Self::new();

        if let Some(skills) = EntityPattern::gazetteer("SKILL", vocabulary.terms()).map_err(build)? {
            recognizer.patterns.push(skills);
        }

        recognizer.patterns.push(
            EntityPattern::new(
                "EXPERIENCE",
                r"\b\d{1,2} (?:years?|yrs?|months?)(?: of(?: \w+)? experience)?\b",
            )
            .map_err(build)?,
        );
        recognizer.patterns.push(
            EntityPattern::new(
                "DATE",
                r"\b(?:(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?) )?(?:19|20)\d{2}(?: (?:to )?(?:(?:19|20)\d{2}|present|current))?\b",
            )
            .map_err(build)?,
        );

        let locations: Vec<String> = locations
            .iter()
            .map(|l| normalize(l).into_string())
            .collect();
        if let Some(places) =
            EntityPattern::gazetteer("GPE", locations.iter().map(String::as_str)).map_err(build)?
        {
            recognizer.patterns.push(places);
        }

        Ok(recognizer)
    }

    #[must_use]
    pub fn default_locations() -> Vec<String> {
        DEFAULT_LOCATIONS.iter().map(ToString::to_string).collect()
    }
}

impl Default for RuleBasedRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRecognizer for RuleBasedRecognizer {
    fn strategy(&self) -> RecognizerStrategy {
        RecognizerStrategy::RuleBased
    }

    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>> {
        let mut entities = Vec::new();

        for pattern in &self.patterns {
            for found in pattern.regex.find_iter(text) {
                entities.push(RecognizedEntity::new(
                    found.as_str(),
                    pattern.label.as_str(),
                    found.start(),
                    found.end(),
                ));
            }
        }

        Ok(entities)
    }
}
