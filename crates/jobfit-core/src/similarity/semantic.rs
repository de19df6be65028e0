use std::sync::Arc;

use super::{cosine_similarity, MatchScore, ScoringMethod, SimilarityScorer};
use crate::error::{Error, Result};
use crate::model::ModelCache;
use crate::text::NormalizedText;

/// Maps sentences to fixed-size embedding vectors, one per input.
pub trait SentenceEncoder: Send + Sync {
    fn model_name(&self) -> &str;

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Embedding cosine between resume and job description, clamped at 0.
///
/// Loads the encoder on first use. An encoder that cannot be loaded is an
/// error for the caller; there is no lexical fallback.
pub fn score_semantic(
    resume: &NormalizedText,
    job: &NormalizedText,
    encoder: &ModelCache<dyn SentenceEncoder>,
) -> Result<MatchScore> {
    let model = encoder.get()?;

    if resume.is_empty() || job.is_empty() {
        return Ok(MatchScore::ZERO);
    }

    let embeddings = model.encode(&[resume.as_str(), job.as_str()])?;
    let [resume_vec, job_vec] = embeddings.as_slice() else {
        return Err(Error::Inference(format!(
            "{} returned {} embeddings for 2 inputs",
            model.model_name(),
            embeddings.len()
        )));
    };

    Ok(MatchScore::from_cosine(cosine_similarity(resume_vec, job_vec)))
}

pub struct SemanticScorer {
    encoder: Arc<ModelCache<dyn SentenceEncoder>>,
}

impl SemanticScorer {
    #[must_use]
    pub fn new(encoder: Arc<ModelCache<dyn SentenceEncoder>>) -> Self {
        Self { encoder }
    }
}

impl SimilarityScorer for SemanticScorer {
    fn method(&self) -> ScoringMethod {
        ScoringMethod::Semantic
    }

    fn score(&self, resume: &NormalizedText, job: &NormalizedText) -> Result<MatchScore> {
        score_semantic(resume, job, &self.encoder)
    }
}

#[cfg(feature = "bert")]
mod bert {
    use std::sync::Mutex;

    use rust_bert::pipelines::sentence_embeddings::{
        SentenceEmbeddingsBuilder, SentenceEmbeddingsModel, SentenceEmbeddingsModelType,
    };

    use super::SentenceEncoder;
    use crate::error::{Error, Result};

    /// all-MiniLM-L6-v2 sentence embeddings.
    pub struct BertSentenceEncoder {
        model: Mutex<SentenceEmbeddingsModel>,
    }

    impl BertSentenceEncoder {
        pub const MODEL_NAME: &'static str = "all-MiniLM-L6-v2";

        pub fn load() -> Result<Self> {
            let model = SentenceEmbeddingsBuilder::remote(SentenceEmbeddingsModelType::AllMiniLmL6V2)
                .create_model()
                .map_err(|e| Error::ModelUnavailable(format!("{}: {e}", Self::MODEL_NAME)))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl SentenceEncoder for BertSentenceEncoder {
        fn model_name(&self) -> &str {
            Self::MODEL_NAME
        }

        fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            let model = self
                .model
                .lock()
                .map_err(|_| Error::Inference("sentence encoder lock poisoned".into()))?;
            model
                .encode(texts)
                .map_err(|e| Error::Inference(e.to_string()))
        }
    }
}

#[cfg(feature = "bert")]
pub use bert::BertSentenceEncoder;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;

    /// Bag-of-letters embedding, enough to give related texts a high cosine.
    struct LetterEncoder;

    impl SentenceEncoder for LetterEncoder {
        fn model_name(&self) -> &str {
            "letters"
        }

        fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0_f32; 26];
                    for b in t.bytes().filter(u8::is_ascii_lowercase) {
                        v[usize::from(b - b'a')] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    struct FixedEncoder(Vec<Vec<f32>>);

    impl SentenceEncoder for FixedEncoder {
        fn model_name(&self) -> &str {
            "fixed"
        }

        fn encode(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(self.0.clone())
        }
    }

    fn cache(encoder: impl SentenceEncoder + 'static) -> ModelCache<dyn SentenceEncoder> {
        let model: Arc<dyn SentenceEncoder> = Arc::new(encoder);
        ModelCache::preloaded("test-encoder", model)
    }

    #[test]
    fn test_identical_texts_score_full() {
        let text = normalize("Python SQL machine learning");
        let score = score_semantic(&text, &text, &cache(LetterEncoder)).unwrap();
        assert!((score.value() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_cosine_clamped() {
        let encoder = FixedEncoder(vec![vec![1.0, 0.0], vec![-1.0, 0.0]]);
        let score = score_semantic(&normalize("a"), &normalize("b"), &cache(encoder)).unwrap();
        assert_eq!(score, MatchScore::ZERO);
    }

    #[test]
    fn test_unavailable_backend_is_error() {
        let encoder: ModelCache<dyn SentenceEncoder> =
            ModelCache::unavailable("all-MiniLM-L6-v2", "built without bert support");
        let result = score_semantic(&normalize("python"), &normalize("python"), &encoder);
        assert!(matches!(result, Err(Error::ModelUnavailable(_))));
    }

    #[test]
    fn test_unavailable_backend_errors_even_for_empty_text() {
        let encoder: ModelCache<dyn SentenceEncoder> =
            ModelCache::unavailable("all-MiniLM-L6-v2", "no weights");
        assert!(score_semantic(&normalize(""), &normalize("python"), &encoder).is_err());
    }

    #[test]
    fn test_wrong_embedding_count_is_inference_error() {
        let encoder = FixedEncoder(vec![vec![1.0, 0.0]]);
        let result = score_semantic(&normalize("a"), &normalize("b"), &cache(encoder));
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[test]
    fn test_scorer_uses_shared_cache() {
        let scorer = SemanticScorer::new(Arc::new(cache(LetterEncoder)));
        assert_eq!(scorer.method(), ScoringMethod::Semantic);
        let score = scorer
            .score(&normalize("data analysis"), &normalize("excel tableau"))
            .unwrap();
        assert!((0.0..=100.0).contains(&score.value()));
    }
}
