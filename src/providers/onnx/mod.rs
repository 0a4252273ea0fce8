//! ONNX cross-encoders for relation scoring and relation labelling.
//!
//! Both models read `(context + left snippet, right snippet)` pairs. Model and
//! tokenizer files are pinned by SHA-256 and verified before the session is
//! opened.
mod artefact;
mod classifier;
mod config;
mod errors;
mod head;

pub use artefact::{ModelArtefact, sha256_hex};
pub use config::{DEFAULT_CONTEXT_SEPARATOR, OnnxPairClassifierConfig};
pub use errors::OnnxPairClassifierError;
pub use head::{OutputHead, binary_softmax};

use crate::providers::{ModelError, PairBatch, TextPairLabeler, TextPairScorer};
use classifier::OnnxPairClassifier;

/// Relation-presence scorer backed by a two-logit ONNX model.
#[derive(Debug)]
pub struct OnnxRelationScorer {
    inner: OnnxPairClassifier,
}

impl OnnxRelationScorer {
    /// Builds the scorer from disk artefacts.
    ///
    /// # Errors
    ///
    /// Returns [`OnnxPairClassifierError::WrongHead`] unless the head is
    /// [`OutputHead::Relation`], or any artefact and session error.
    ///
    /// # Examples
    /// ```no_run
    /// use rst_predictors::providers::onnx::{
    ///     DEFAULT_CONTEXT_SEPARATOR, ModelArtefact, OnnxPairClassifierConfig, OnnxPairClassifierError,
    ///     OnnxRelationScorer, OutputHead,
    /// };
    ///
    /// # fn main() -> Result<(), OnnxPairClassifierError> {
    /// let config = OnnxPairClassifierConfig {
    ///     model: ModelArtefact {
    ///         path: "/models/structure.onnx".into(),
    ///         sha256: "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".into(),
    ///     },
    ///     tokenizer: ModelArtefact {
    ///         path: "/models/tokenizer.json".into(),
    ///         sha256: "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210".into(),
    ///     },
    ///     input_names: vec!["input_ids".into(), "attention_mask".into()],
    ///     output_names: vec!["logits".into()],
    ///     max_sequence_length: 256,
    ///     pad_token: "[PAD]".into(),
    ///     pad_id: 0,
    ///     head: OutputHead::Relation,
    ///     context_separator: DEFAULT_CONTEXT_SEPARATOR.into(),
    /// };
    /// let scorer = OnnxRelationScorer::new(config)?;
    /// # drop(scorer);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: OnnxPairClassifierConfig) -> Result<Self, OnnxPairClassifierError> {
        if config.head != OutputHead::Relation {
            return Err(OnnxPairClassifierError::WrongHead("relation probabilities"));
        }
        OnnxPairClassifier::new(config).map(|inner| Self { inner })
    }
}

impl TextPairScorer for OnnxRelationScorer {
    fn predict_proba_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<[f32; 2]>, ModelError> {
        let logits = self.inner.logits_batch(batch).map_err(ModelError::backend)?;
        relation_probabilities(&logits)
    }
}

fn relation_probabilities(logits: &[Vec<f32>]) -> Result<Vec<[f32; 2]>, ModelError> {
    logits
        .iter()
        .map(|pair| match pair.as_slice() {
            [neg, pos] => Ok(binary_softmax(*neg, *pos)),
            _ => Err(ModelError::backend(OnnxPairClassifierError::WrongHead(
                "relation probabilities",
            ))),
        })
        .collect()
}

/// Relation labeller backed by an ONNX model with one logit per class.
#[derive(Debug)]
pub struct OnnxLabeler {
    inner: OnnxPairClassifier,
}

impl OnnxLabeler {
    /// Builds the labeller from disk artefacts.
    ///
    /// # Errors
    ///
    /// Returns [`OnnxPairClassifierError::WrongHead`] unless the head is
    /// [`OutputHead::Classes`], or any artefact and session error.
    pub fn new(config: OnnxPairClassifierConfig) -> Result<Self, OnnxPairClassifierError> {
        if !matches!(config.head, OutputHead::Classes(_)) {
            return Err(OnnxPairClassifierError::WrongHead("class labels"));
        }
        OnnxPairClassifier::new(config).map(|inner| Self { inner })
    }
}

impl TextPairLabeler for OnnxLabeler {
    fn predict_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<String>, ModelError> {
        let logits = self.inner.logits_batch(batch).map_err(ModelError::backend)?;
        logits
            .iter()
            .map(|pair| {
                self.inner
                    .head()
                    .class_of(pair)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        ModelError::backend(OnnxPairClassifierError::WrongHead("class labels"))
                    })
            })
            .collect()
    }
}
