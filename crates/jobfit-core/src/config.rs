use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compare::StatusThresholds;
use crate::entity::{LabelTable, RuleBasedRecognizer, SkillVocabulary};
use crate::error::{Error, Result};

pub const CONFIG_ENV: &str = "JOBFIT_CONFIG";
pub const RECOGNIZER_ENV: &str = "JOBFIT_RECOGNIZER";

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        "Python Developer",
        "We are looking for a Python Developer with experience in Python, SQL, data analysis, and machine learning.",
    ),
    (
        "Data Analyst",
        "Seeking a Data Analyst skilled in Excel, SQL, data analysis, and communication.",
    ),
    (
        "ML Engineer",
        "Hiring an ML Engineer with expertise in Python, deep learning, machine learning, and project management.",
    ),
    (
        "Project Manager",
        "Project Manager needed with leadership, project management, and communication skills.",
    ),
];

/// Which entity recognizer resumes are run through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerBackend {
    #[default]
    Rules,
    Bert,
}

impl FromStr for RecognizerBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rules" | "rule" | "rule_based" => Ok(Self::Rules),
            "bert" | "ner" => Ok(Self::Bert),
            other => Err(Error::Config(format!("unknown recognizer backend: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderBackend {
    #[default]
    MiniLm,
    Disabled,
}

/// Matcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Terms searched for in job descriptions and tagged as skills in resumes
    pub skill_vocabulary: SkillVocabulary,
    /// Recognizer label to entity bucket mapping
    pub entity_labels: LabelTable,
    /// Place names the rule-based recognizer tags as locations
    pub locations: Vec<String>,
    pub recognizer: RecognizerBackend,
    pub encoder: EncoderBackend,
    pub thresholds: StatusThresholds,
    /// How many missing skills suggestions mention
    pub top_missing: usize,
    /// Built-in job descriptions, keyed by display name
    pub job_templates: BTreeMap<String, String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            skill_vocabulary: SkillVocabulary::default(),
            entity_labels: LabelTable::default(),
            locations: RuleBasedRecognizer::default_locations(),
            recognizer: RecognizerBackend::default(),
            encoder: EncoderBackend::default(),
            thresholds: StatusThresholds::default(),
            top_missing: 3,
            job_templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(name, text)| ((*name).to_string(), (*text).to_string()))
                .collect(),
        }
    }
}

impl MatcherConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// `<config dir>/jobfit/config.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jobfit").join("config.json"))
    }

    /// Resolves configuration from, in order: `explicit`, `JOBFIT_CONFIG`,
    /// the default path if it exists, built-in defaults. Environment
    /// overrides are applied last.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit
            .map(Path::to_path_buf)
            .or(from_env)
            .or_else(|| Self::default_path().filter(|p| p.is_file()));

        let config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(RECOGNIZER_ENV) {
            self.recognizer = value.parse()?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let StatusThresholds { great, moderate } = self.thresholds;
        if !(0.0..=100.0).contains(&moderate) || !(0.0..=100.0).contains(&great) {
            return Err(Error::Config("status thresholds must be within 0..=100".into()));
        }
        if moderate > great {
            return Err(Error::Config(format!(
                "moderate threshold {moderate} is above great threshold {great}"
            )));
        }
        Ok(())
    }

    /// Template text by name, ignoring case.
    pub fn template(&self, name: &str) -> Result<&str> {
        self.job_templates
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))
            .map(|(_, text)| text.as_str())
            .ok_or_else(|| Error::UnknownTemplate(name.to_string()))
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.job_templates.keys().map(String::as_str)
    }
}
