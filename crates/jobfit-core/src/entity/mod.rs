#[cfg(feature = "bert")]
mod bert;
mod rules;
mod vocabulary;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::ModelCache;
use crate::text::NormalizedText;

#[cfg(feature = "bert")]
pub use bert::BertRecognizer;
pub use rules::{EntityPattern, RuleBasedRecognizer};
pub use vocabulary::{extract_jd_skills, SkillSet, SkillVocabulary};

/// Where a recognized entity ends up in an [`EntityBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityBucket {
    Skills,
    Experience,
    Location,
}

/// Recognizer label to bucket lookup. Labels are matched case-insensitively;
/// labels absent from the table are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, EntityBucket>",
    into = "BTreeMap<String, EntityBucket>"
)]
pub struct LabelTable(BTreeMap<String, EntityBucket>);

impl LabelTable {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn with_label(mut self, label: &str, bucket: EntityBucket) -> Self {
        self.insert(label, bucket);
        self
    }

    pub fn insert(&mut self, label: &str, bucket: EntityBucket) {
        self.0.insert(label.to_uppercase(), bucket);
    }

    #[must_use]
    pub fn bucket(&self, label: &str) -> Option<EntityBucket> {
        self.0.get(&label.to_uppercase()).copied()
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

impl From<BTreeMap<String, EntityBucket>> for LabelTable {
    fn from(labels: BTreeMap<String, EntityBucket>) -> Self {
        let mut table = Self::new();
        for (label, bucket) in labels {
            table.insert(&label, bucket);
        }
        table
    }
}

impl From<LabelTable> for BTreeMap<String, EntityBucket> {
    fn from(table: LabelTable) -> Self {
        table.0
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new()
            .with_label("SKILL", EntityBucket::Skills)
            .with_label("SKILLS", EntityBucket::Skills)
            .with_label("EXPERIENCE", EntityBucket::Experience)
            .with_label("DATE", EntityBucket::Experience)
            .with_label("GPE", EntityBucket::Location)
            .with_label("LOC", EntityBucket::Location)
            .with_label("LOCATION", EntityBucket::Location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl RecognizedEntity {
    #[must_use]
    pub fn new(text: impl Into<String>, label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerStrategy {
    RuleBased,
    NerModel,
}

pub trait EntityRecognizer: Send + Sync {
    fn strategy(&self) -> RecognizerStrategy;

    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>>;
}

/// Skills, experience markers and locations found in one resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBundle {
    pub skills: BTreeSet<String>,
    pub experience: BTreeSet<String>,
    pub location: BTreeSet<String>,
}

impl EntityBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.experience.is_empty() && self.location.is_empty()
    }

    pub fn insert(&mut self, bucket: EntityBucket, text: String) {
        match bucket {
            EntityBucket::Skills => self.skills.insert(text),
            EntityBucket::Experience => self.experience.insert(text),
            EntityBucket::Location => self.location.insert(text),
        };
    }

    #[must_use]
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn from_entities(entities: Vec<RecognizedEntity>, labels: &LabelTable) -> Self {
        let mut bundle = Self::new();
        for entity in entities {
            if let Some(bucket) = labels.bucket(&entity.label) {
                bundle.insert(bucket, entity.text);
            }
        }
        bundle
    }
}

/// Runs the cached recognizer over a resume. Model load or inference
/// failures produce an empty bundle rather than an error.
#[must_use]
pub fn extract_resume_entities(
    text: &NormalizedText,
    recognizer: &ModelCache<dyn EntityRecognizer>,
    labels: &LabelTable,
) -> EntityBundle {
    if text.is_empty() {
        return EntityBundle::new();
    }

    let model: Arc<dyn EntityRecognizer> = match recognizer.get() {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!("Entity recognizer unavailable, continuing without entities: {}", e);
            return EntityBundle::new();
        }
    };

    match model.recognize(text.as_str()) {
        Ok(entities) => {
            tracing::debug!(
                "Recognized {} entities ({:?})",
                entities.len(),
                model.strategy()
            );
            EntityBundle::from_entities(entities, labels)
        }
        Err(e) => {
            tracing::warn!("Entity recognition failed, continuing without entities: {}", e);
            EntityBundle::new()
        }
    }
}
