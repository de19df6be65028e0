//! Lazily loaded, process-lifetime model handles.
//!
//! A [`ModelCache`] runs its loader at most once. The loaded model (or the
//! load failure) is kept for the life of the cache and shared read-only by
//! every caller.

use std::sync::{Arc, OnceLock};

use crate::config::{EncoderBackend, MatcherConfig, RecognizerBackend};
use crate::entity::{EntityRecognizer, RuleBasedRecognizer};
use crate::error::{Error, Result};
use crate::similarity::SentenceEncoder;

type Loader<M> = Box<dyn Fn() -> Result<Arc<M>> + Send + Sync>;

pub struct ModelCache<M: ?Sized> {
    name: String,
    loader: Loader<M>,
    slot: OnceLock<std::result::Result<Arc<M>, String>>,
}

impl<M: ?Sized> ModelCache<M> {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<M>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            slot: OnceLock::new(),
        }
    }

    /// A cache that already holds `model`; the loader never runs.
    pub fn preloaded(name: impl Into<String>, model: Arc<M>) -> Self
    where
        M: 'static,
    {
        let cache = Self::new(name, || {
            Err(Error::ModelUnavailable("preloaded cache has no loader".into()))
        });
        let _ = cache.slot.set(Ok(model));
        cache
    }

    /// A cache whose model can never be loaded.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self
    where
        M: 'static,
    {
        let reason = reason.into();
        Self::new(name, move || Err(Error::ModelUnavailable(reason.clone())))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }

    pub fn get(&self) -> Result<Arc<M>> {
        let slot = self.slot.get_or_init(|| {
            tracing::info!("Loading model: {}", self.name);
            match (self.loader)() {
                Ok(model) => Ok(model),
                Err(e) => {
                    tracing::warn!("Model {} failed to load: {}", self.name, e);
                    Err(match e {
                        Error::ModelUnavailable(reason) => format!("{}: {reason}", self.name),
                        other => format!("{}: {other}", self.name),
                    })
                }
            }
        });

        slot.clone().map_err(Error::ModelUnavailable)
    }
}

impl<M: ?Sized> std::fmt::Debug for ModelCache<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

/// The recognizer and encoder caches used by a matching pipeline. Cloning
/// shares the caches, so every clone loads each model at most once.
#[derive(Debug, Clone)]
pub struct Models {
    pub recognizer: Arc<ModelCache<dyn EntityRecognizer>>,
    pub encoder: Arc<ModelCache<dyn SentenceEncoder>>,
}

impl Models {
    pub const ENCODER_NAME: &'static str = "all-MiniLM-L6-v2";

    #[must_use]
    pub fn new(
        recognizer: ModelCache<dyn EntityRecognizer>,
        encoder: ModelCache<dyn SentenceEncoder>,
    ) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            encoder: Arc::new(encoder),
        }
    }

    /// Lazy caches for the configured backends. Nothing is loaded until a
    /// cache is first used.
    #[must_use]
    pub fn from_config(config: &MatcherConfig) -> Self {
        Self::new(recognizer_cache(config), encoder_cache(config.encoder))
    }
}

fn recognizer_cache(config: &MatcherConfig) -> ModelCache<dyn EntityRecognizer> {
    match config.recognizer {
        RecognizerBackend::Rules => {
            let vocabulary = config.skill_vocabulary.clone();
            let locations = config.locations.clone();
            ModelCache::new("rule-based-ner", move || {
                let recognizer = RuleBasedRecognizer::with_default_patterns(&vocabulary, &locations)?;
                Ok(Arc::new(recognizer) as Arc<dyn EntityRecognizer>)
            })
        }
        #[cfg(feature = "bert")]
        RecognizerBackend::Bert => ModelCache::new("bert-ner", || {
            Ok(Arc::new(crate::entity::BertRecognizer::load()?) as Arc<dyn EntityRecognizer>)
        }),
        #[cfg(not(feature = "bert"))]
        RecognizerBackend::Bert => {
            ModelCache::unavailable("bert-ner", "jobfit was built without the `bert` feature")
        }
    }
}

fn encoder_cache(backend: EncoderBackend) -> ModelCache<dyn SentenceEncoder> {
    match backend {
        EncoderBackend::Disabled => {
            ModelCache::unavailable(Models::ENCODER_NAME, "sentence encoder disabled in configuration")
        }
        #[cfg(feature = "bert")]
        EncoderBackend::MiniLm => ModelCache::new(Models::ENCODER_NAME, || {
            Ok(Arc::new(crate::similarity::BertSentenceEncoder::load()?) as Arc<dyn SentenceEncoder>)
        }),
        #[cfg(not(feature = "bert"))]
        EncoderBackend::MiniLm => ModelCache::unavailable(
            Models::ENCODER_NAME,
            "jobfit was built without the `bert` feature",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_loader_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache: ModelCache<String> = ModelCache::new("stub", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new("model".to_string()))
        });

        assert!(!cache.is_loaded());
        let a = cache.get().unwrap();
        let b = cache.get().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_failure_is_remembered() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache: ModelCache<String> = ModelCache::new("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::ModelUnavailable("no weights".into()))
        });

        assert!(matches!(cache.get(), Err(Error::ModelUnavailable(_))));
        assert!(matches!(cache.get(), Err(Error::ModelUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preloaded_skips_loader() {
        let cache = ModelCache::preloaded("stub", Arc::new(7_u32));
        assert!(cache.is_loaded());
        assert_eq!(*cache.get().unwrap(), 7);
    }

    #[test]
    fn test_concurrent_get_shares_instance() {
        let cache: Arc<ModelCache<Vec<f32>>> =
            Arc::new(ModelCache::new("shared", || Ok(Arc::new(vec![1.0, 2.0]))));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get().unwrap())
            })
            .collect();

        let models: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_rule_based_models_load_lazily() {
        let models = Models::from_config(&MatcherConfig::default());
        assert!(!models.recognizer.is_loaded());

        let recognizer = models.recognizer.get().unwrap();
        let entities = recognizer.recognize("python developer in berlin").unwrap();
        assert!(entities.iter().any(|e| e.label == "SKILL" && e.text == "python"));
        assert!(models.recognizer.is_loaded());
    }

    #[test]
    fn test_disabled_encoder_is_unavailable() {
        let config = MatcherConfig {
            encoder: EncoderBackend::Disabled,
            ..MatcherConfig::default()
        };
        let models = Models::from_config(&config);
        assert!(matches!(models.encoder.get(), Err(Error::ModelUnavailable(_))));
    }

    #[cfg(not(feature = "bert"))]
    #[test]
    fn test_bert_backends_unavailable_without_feature() {
        let config = MatcherConfig {
            recognizer: RecognizerBackend::Bert,
            ..MatcherConfig::default()
        };
        let models = Models::from_config(&config);
        assert!(models.recognizer.get().is_err());
        assert!(models.encoder.get().is_err());
    }

    #[test]
    fn test_clones_share_caches() {
        let models = Models::from_config(&MatcherConfig::default());
        let clone = models.clone();
        let a = models.recognizer.get().unwrap();
        let b = clone.recognizer.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
