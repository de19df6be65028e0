use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::compare::{compare_skills, MatchStatus};
use crate::config::MatcherConfig;
use crate::document::{CompositeExtractor, Document};
use crate::entity::{extract_jd_skills, extract_resume_entities, EntityBundle, SkillSet};
use crate::error::{Error, Result};
use crate::model::Models;
use crate::similarity::{score_lexical, score_semantic, MatchScore, ScoringMethod};
use crate::text::{normalize, NormalizedText};

const TOP_SKILLS: usize = 10;

/// A resume after text extraction, normalization and entity recognition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedResume {
    pub name: String,
    pub text: NormalizedText,
    pub entities: EntityBundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedJob {
    pub name: String,
    pub text: NormalizedText,
    pub skills: SkillSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub resume: String,
    pub job: String,
    pub method: ScoringMethod,
    pub score: MatchScore,
    pub status: MatchStatus,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub top_missing: Vec<String>,
    pub entities: EntityBundle,
    pub suggestions: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalytics {
    pub count: usize,
    pub average_score: f64,
    pub top_matched_skills: Vec<SkillCount>,
}

impl BatchAnalytics {
    /// Result count, mean score rounded to two decimals, and the ten most
    /// frequently matched skills (ties broken by skill name).
    #[must_use]
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let total: f64 = reports.iter().map(|r| r.score.value()).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = total / reports.len() as f64;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for skill in reports.iter().flat_map(|r| &r.matched) {
            *counts.entry(skill.as_str()).or_default() += 1;
        }
        let mut top: Vec<SkillCount> = counts
            .into_iter()
            .map(|(skill, count)| SkillCount {
                skill: skill.to_string(),
                count,
            })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count));
        top.truncate(TOP_SKILLS);

        Self {
            count: reports.len(),
            average_score: (average * 100.0).round() / 100.0,
            top_matched_skills: top,
        }
    }
}

/// Ranked matches plus aggregate statistics for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub method: ScoringMethod,
    pub matches: Vec<MatchReport>,
    pub analytics: BatchAnalytics,
}

impl BatchReport {
    #[must_use]
    pub fn new(method: ScoringMethod, mut matches: Vec<MatchReport>) -> Self {
        rank_by_score(&mut matches, |r| r.score);
        let analytics = BatchAnalytics::from_reports(&matches);
        Self {
            method,
            matches,
            analytics,
        }
    }
}

/// Sorts by score descending. Equal scores keep their relative input order.
pub fn rank_by_score<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> MatchScore,
{
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

/// End-to-end matching of resumes against job descriptions.
///
/// Cloning is cheap and shares the model caches, so a single pipeline can
/// be handed to every worker of a batch.
#[derive(Clone)]
pub struct MatchPipeline {
    config: Arc<MatcherConfig>,
    models: Models,
    extractor: Arc<CompositeExtractor>,
    workers: usize,
}

impl MatchPipeline {
    #[must_use]
    pub fn new(config: MatcherConfig) -> Self {
        let models = Models::from_config(&config);
        Self {
            config: Arc::new(config),
            models,
            extractor: Arc::new(CompositeExtractor::default()),
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }

    #[must_use]
    pub fn with_models(mut self, models: Models) -> Self {
        self.models = models;
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: CompositeExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    #[must_use]
    pub const fn models(&self) -> &Models {
        &self.models
    }

    #[must_use]
    pub fn prepare_resume(&self, document: &Document) -> PreparedResume {
        let raw = self.extractor.extract_text(document);
        self.prepare_resume_text(document.name(), &raw)
    }

    #[must_use]
    pub fn prepare_resume_text(&self, name: &str, raw: &str) -> PreparedResume {
        let text = normalize(raw);
        let entities =
            extract_resume_entities(&text, &self.models.recognizer, &self.config.entity_labels);
        tracing::debug!(
            "Prepared resume {}: {} words, {} skills",
            name,
            text.words().count(),
            entities.skills.len()
        );
        PreparedResume {
            name: name.to_string(),
            text,
            entities,
        }
    }

    #[must_use]
    pub fn prepare_job(&self, name: &str, raw: &str) -> PreparedJob {
        let text = normalize(raw);
        let skills = extract_jd_skills(&text, &self.config.skill_vocabulary);
        PreparedJob {
            name: name.to_string(),
            text,
            skills,
        }
    }

    pub fn prepare_template(&self, name: &str) -> Result<PreparedJob> {
        let text = self.config.template(name)?;
        Ok(self.prepare_job(name, text))
    }

    pub fn score(
        &self,
        resume: &NormalizedText,
        job: &NormalizedText,
        method: ScoringMethod,
    ) -> Result<MatchScore> {
        match method {
            ScoringMethod::Lexical => Ok(score_lexical(resume, job)),
            ScoringMethod::Semantic => score_semantic(resume, job, &self.models.encoder),
        }
    }

    pub fn evaluate(
        &self,
        resume: &PreparedResume,
        job: &PreparedJob,
        method: ScoringMethod,
    ) -> Result<MatchReport> {
        let score = self.score(&resume.text, &job.text, method)?;
        let comparison = compare_skills(&resume.entities, &job.skills);

        let thresholds = &self.config.thresholds;
        let top_n = self.config.top_missing;

        tracing::debug!("{} vs {}: {} ({})", resume.name, job.name, score, method);

        Ok(MatchReport {
            resume: resume.name.clone(),
            job: job.name.clone(),
            method,
            score,
            status: thresholds.status(score),
            top_missing: comparison.top_missing(top_n).to_vec(),
            suggestions: thresholds.suggestions(score, &comparison, top_n),
            matched: comparison.matched,
            missing: comparison.missing,
            entities: resume.entities.clone(),
            evaluated_at: Utc::now(),
        })
    }

    /// Extracts and scores every resume against one job description.
    pub async fn rank_resumes(
        &self,
        resumes: Vec<Document>,
        job: PreparedJob,
        method: ScoringMethod,
    ) -> Result<BatchReport> {
        let job = Arc::new(job);
        let matches = self
            .run_batch(resumes, move |pipeline, document| {
                let resume = pipeline.prepare_resume(&document);
                pipeline.evaluate(&resume, &job, method)
            })
            .await?;
        Ok(BatchReport::new(method, matches))
    }

    /// Scores one resume against every job description.
    pub async fn rank_jobs(
        &self,
        resume: PreparedResume,
        jobs: Vec<PreparedJob>,
        method: ScoringMethod,
    ) -> Result<BatchReport> {
        let resume = Arc::new(resume);
        let matches = self
            .run_batch(jobs, move |pipeline, job| {
                pipeline.evaluate(&resume, &job, method)
            })
            .await?;
        Ok(BatchReport::new(method, matches))
    }

    /// Runs `evaluate` over `items` on blocking worker threads, at most
    /// `workers` at a time. Results come back in input order; the first
    /// failure fails the batch.
    async fn run_batch<T, F>(&self, items: Vec<T>, evaluate: F) -> Result<Vec<MatchReport>>
    where
        T: Send + 'static,
        F: Fn(&Self, T) -> Result<MatchReport> + Send + Sync + 'static,
    {
        let total = items.len();
        let permits = Arc::new(Semaphore::new(self.workers));
        let evaluate = Arc::new(evaluate);
        let mut tasks = JoinSet::new();

        tracing::debug!("Evaluating {} pairs on {} workers", total, self.workers);

        for (index, item) in items.into_iter().enumerate() {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| Error::Task(e.to_string()))?;
            let pipeline = self.clone();
            let evaluate = Arc::clone(&evaluate);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, evaluate(&pipeline, item))
            });
        }

        let mut slots: Vec<Option<MatchReport>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, report) = joined.map_err(|e| Error::Task(e.to_string()))?;
            match report {
                Ok(report) => slots[index] = Some(report),
                Err(e) => {
                    tracing::warn!("Batch aborted: {}", e);
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

impl std::fmt::Debug for MatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchPipeline")
            .field("models", &self.models)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures;
    use crate::entity::{EntityRecognizer, RecognizedEntity, RecognizerStrategy};
    use crate::model::ModelCache;
    use crate::similarity::SentenceEncoder;

    struct ConstantEncoder;

    impl SentenceEncoder for ConstantEncoder {
        fn model_name(&self) -> &str {
            "constant"
        }

        fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.6, 0.8]).collect())
        }
    }

    struct NoEntities;

    impl EntityRecognizer for NoEntities {
        fn strategy(&self) -> RecognizerStrategy {
            RecognizerStrategy::NerModel
        }

        fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>> {
            Ok(Vec::new())
        }
    }

    fn pipeline() -> MatchPipeline {
        MatchPipeline::new(MatcherConfig::default()).with_workers(2)
    }

    fn report(name: &str, score: f64) -> MatchReport {
        MatchReport {
            resume: name.to_string(),
            job: "jd".to_string(),
            method: ScoringMethod::Lexical,
            score: MatchScore::from_cosine(score / 100.0),
            status: MatchStatus::Low,
            matched: Vec::new(),
            missing: Vec::new(),
            top_missing: Vec::new(),
            entities: EntityBundle::new(),
            suggestions: Vec::new(),
            evaluated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let mut reports = vec![
            report("A", 42.1),
            report("B", 87.3),
            report("C", 87.3),
            report("D", 10.0),
        ];
        rank_by_score(&mut reports, |r| r.score);
        let order: Vec<_> = reports.iter().map(|r| r.resume.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn test_evaluate_scenario() {
        let config = MatcherConfig {
            skill_vocabulary: crate::entity::SkillVocabulary::new(["python", "sql", "excel"]),
            ..MatcherConfig::default()
        };
        let pipeline = MatchPipeline::new(config);

        let resume = pipeline.prepare_resume_text("resume.docx", "Python SQL machine learning");
        let job = pipeline.prepare_job("jd.txt", "We need Python and SQL skills");
        let report = pipeline
            .evaluate(&resume, &job, ScoringMethod::Lexical)
            .unwrap();

        assert_eq!(job.skills.iter().collect::<Vec<_>>(), vec!["python", "sql"]);
        assert_eq!(report.matched, vec!["python", "sql"]);
        assert!(report.missing.is_empty());
        assert!(report.top_missing.is_empty());
        assert!(report.score.value() > 0.0);
        assert!(report.suggestions[0].contains("covers all"));
    }

    #[test]
    fn test_empty_resume_scores_zero() {
        let pipeline = pipeline();
        let resume = pipeline.prepare_resume(&Document::new("blank.txt", b"irrelevant".to_vec()));
        let job = pipeline.prepare_template("Data Analyst").unwrap();

        let report = pipeline
            .evaluate(&resume, &job, ScoringMethod::Lexical)
            .unwrap();

        assert!(resume.text.is_empty());
        assert!(resume.entities.is_empty());
        assert_eq!(report.score, MatchScore::ZERO);
        assert_eq!(report.status, MatchStatus::Low);
        assert_eq!(report.missing.len(), 4);
        assert_eq!(report.top_missing, vec!["communication", "data analysis", "excel"]);
    }

    #[test]
    fn test_semantic_without_backend_is_fatal() {
        let pipeline = pipeline().with_models(Models::new(
            ModelCache::preloaded("none", Arc::new(NoEntities) as Arc<dyn EntityRecognizer>),
            ModelCache::unavailable("all-MiniLM-L6-v2", "not installed"),
        ));
        let resume = pipeline.prepare_resume_text("cv", "python");
        let job = pipeline.prepare_job("jd", "python");

        let result = pipeline.evaluate(&resume, &job, ScoringMethod::Semantic);
        assert!(matches!(result, Err(Error::ModelUnavailable(_))));
    }

    #[test]
    fn test_analytics_counts_and_average() {
        let mut a = report("a", 40.0);
        a.matched = vec!["python".into(), "sql".into()];
        let mut b = report("b", 50.5);
        b.matched = vec!["sql".into()];
        let mut c = report("c", 60.0);
        c.matched = vec!["excel".into(), "sql".into()];

        let analytics = BatchAnalytics::from_reports(&[a, b, c]);

        assert_eq!(analytics.count, 3);
        assert!((analytics.average_score - 50.17).abs() < 1e-9);
        assert_eq!(
            analytics.top_matched_skills,
            vec![
                SkillCount { skill: "sql".into(), count: 3 },
                SkillCount { skill: "excel".into(), count: 1 },
                SkillCount { skill: "python".into(), count: 1 },
            ]
        );
        assert_eq!(BatchAnalytics::from_reports(&[]), BatchAnalytics::default());
    }

    #[tokio::test]
    async fn test_rank_resumes_orders_by_score() {
        let pipeline = pipeline();
        let job = pipeline.prepare_template("Python Developer").unwrap();
        let resumes = vec![
            Document::new(
                "weak.docx",
                fixtures::docx_with_paragraphs(&["Florist", "Arranging bouquets"]),
            ),
            Document::new(
                "strong.docx",
                fixtures::docx_with_paragraphs(&[
                    "Python Developer",
                    "Python, SQL, data analysis and machine learning experience",
                ]),
            ),
            Document::new("unknown.rtf", b"{\\rtf1 python}".to_vec()),
        ];

        let batch = pipeline
            .rank_resumes(resumes, job, ScoringMethod::Lexical)
            .await
            .unwrap();

        let order: Vec<_> = batch.matches.iter().map(|m| m.resume.as_str()).collect();
        assert_eq!(order, vec!["strong.docx", "weak.docx", "unknown.rtf"]);
        assert_eq!(batch.analytics.count, 3);
        assert!(batch.matches[0].matched.contains(&"python".to_string()));
        assert_eq!(batch.analytics.top_matched_skills[0].skill, "data analysis");
    }

    #[tokio::test]
    async fn test_rank_jobs_semantic_uses_shared_encoder() {
        let encoder: Arc<dyn SentenceEncoder> = Arc::new(ConstantEncoder);
        let pipeline = pipeline().with_models(Models::new(
            ModelCache::preloaded("none", Arc::new(NoEntities) as Arc<dyn EntityRecognizer>),
            ModelCache::preloaded("constant", encoder),
        ));
        let resume = pipeline.prepare_resume_text("cv", "python sql");
        let jobs = pipeline
            .config()
            .template_names()
            .map(|name| pipeline.prepare_template(name))
            .collect::<Result<Vec<_>>>()
            .unwrap();

        let batch = pipeline
            .rank_jobs(resume, jobs, ScoringMethod::Semantic)
            .await
            .unwrap();

        assert_eq!(batch.matches.len(), 4);
        assert!(batch
            .matches
            .iter()
            .all(|m| (m.score.value() - 100.0).abs() < 1e-9));
        let order: Vec<_> = batch.matches.iter().map(|m| m.job.as_str()).collect();
        assert_eq!(
            order,
            vec!["Data Analyst", "ML Engineer", "Project Manager", "Python Developer"]
        );
    }

    #[tokio::test]
    async fn test_batch_fails_as_a_whole() {
        let pipeline = pipeline().with_models(Models::new(
            ModelCache::preloaded("none", Arc::new(NoEntities) as Arc<dyn EntityRecognizer>),
            ModelCache::unavailable("all-MiniLM-L6-v2", "not installed"),
        ));
        let resume = pipeline.prepare_resume_text("cv", "python");
        let jobs = vec![
            pipeline.prepare_job("a", "python"),
            pipeline.prepare_job("b", "sql"),
        ];

        let result = pipeline
            .rank_jobs(resume, jobs, ScoringMethod::Semantic)
            .await;
        assert!(matches!(result, Err(Error::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pipeline = pipeline();
        let job = pipeline.prepare_job("jd", "python");
        let batch = pipeline
            .rank_resumes(Vec::new(), job, ScoringMethod::Lexical)
            .await
            .unwrap();
        assert!(batch.matches.is_empty());
        assert_eq!(batch.analytics.count, 0);
    }
}
