#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]

pub mod compare;
pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod similarity;
pub mod text;

pub use compare::{compare_skills, ComparisonResult, MatchStatus, StatusThresholds};
pub use config::{EncoderBackend, MatcherConfig, RecognizerBackend};
pub use document::{extract_text, CompositeExtractor, Document, DocumentFormat, TextExtractor};
pub use entity::{
    extract_jd_skills, extract_resume_entities, EntityBucket, EntityBundle, EntityRecognizer,
    LabelTable, RuleBasedRecognizer, SkillSet, SkillVocabulary,
};
pub use error::{Error, Result};
pub use model::{ModelCache, Models};
pub use pipeline::{
    rank_by_score, BatchAnalytics, BatchReport, MatchPipeline, MatchReport, PreparedJob,
    PreparedResume, SkillCount,
};
pub use similarity::{
    score_lexical, score_semantic, MatchScore, ScoringMethod, SentenceEncoder, SimilarityScorer,
};
pub use text::{normalize, NormalizedText};
