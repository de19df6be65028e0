use std::sync::Mutex;

use rust_bert::pipelines::ner::NERModel;
use rust_bert::pipelines::token_classification::TokenClassificationConfig;

use super::{EntityRecognizer, RecognizedEntity, RecognizerStrategy};
use crate::error::{Error, Result};

/// Pretrained token-classification NER model (CoNLL labels: PER, ORG, LOC, MISC).
pub struct BertRecognizer {
    model: Mutex<NERModel>,
}

impl BertRecognizer {
    pub fn load() -> Result<Self> {
        let model = NERModel::new(TokenClassificationConfig::default())
            .map_err(|e| Error::ModelUnavailable(format!("NER model: {e}")))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl EntityRecognizer for BertRecognizer {
    fn strategy(&self) -> RecognizerStrategy {
        RecognizerStrategy::NerModel
    }

    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>> {
        let model = self
            .model
            .lock()
            .map_err(|_| Error::Inference("NER model lock poisoned".into()))?;

        let entities = model
            .predict_full_entities(&[text])
            .into_iter()
            .flatten()
            .map(|e| {
                RecognizedEntity::new(
                    e.word,
                    e.label,
                    e.offset.begin as usize,
                    e.offset.end as usize,
                )
            })
            .collect();

        Ok(entities)
    }
}
