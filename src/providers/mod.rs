//! Capability interfaces for the trained collaborators a predictor wraps.
//!
//! Each trait covers one concern (feature extraction, relation scoring,
//! labelling, nuclearity) so predictors are assembled by composition. Models
//! are read-only: every method takes `&self`.

#[cfg(feature = "onnx")]
pub mod onnx;

use crate::api::{AnnotatedDocument, CandidatePair, FeatureTable, PairFeatures};
use thiserror::Error;

/// Boxed error raised inside a model backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by collaborator models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model answered with a different number of rows than it was asked.
    #[error("model returned {actual} rows for {expected} inputs")]
    RowCount { expected: usize, actual: usize },
    /// A span or token index fell outside the annotated document.
    #[error("index {index} out of range for {len} {what}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// Any other failure inside the backend.
    #[error("model backend failed: {0}")]
    Backend(#[source] BackendError),
}

impl ModelError {
    /// Wrap an arbitrary backend error.
    pub fn backend(err: impl Into<BackendError>) -> Self {
        Self::Backend(err.into())
    }

    /// Check that a model produced one answer per input row.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RowCount`] when the lengths differ.
    pub fn ensure_rows<T>(expected: usize, values: Vec<T>) -> Result<Vec<T>, Self> {
        if values.len() == expected {
            Ok(values)
        } else {
            Err(Self::RowCount {
                expected,
                actual: values.len(),
            })
        }
    }
}

/// Turns candidate pairs plus document annotation into model-ready features.
pub trait FeatureExtractor {
    /// Compute one feature row per pair, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the pairs do not fit the document or the
    /// extraction pipeline fails.
    fn extract(
        &self,
        pairs: &[CandidatePair],
        document: &AnnotatedDocument,
    ) -> Result<FeatureTable, ModelError>;
}

/// Classical relation model scoring full feature rows.
pub trait TabularRelationScorer {
    /// Return `[negative, positive]` probabilities per row.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict_proba(&self, rows: &[PairFeatures]) -> Result<Vec<[f32; 2]>, ModelError>;
}

/// Classical label model over full feature rows.
pub trait TabularLabeler {
    /// Return one relation label per row.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict(&self, rows: &[PairFeatures]) -> Result<Vec<String>, ModelError>;
}

/// Nuclearity model over full feature rows.
pub trait NuclearityClassifier {
    /// Return one nuclearity class (`NN`, `NS`, `SN`) per row.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict(&self, rows: &[PairFeatures]) -> Result<Vec<String>, ModelError>;
}

/// Text-level relation model reading the snippets directly.
pub trait TextPairScorer {
    /// Return `[negative, positive]` probabilities per pair in the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict_proba_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<[f32; 2]>, ModelError>;
}

/// Text-level label model reading the snippets directly.
pub trait TextPairLabeler {
    /// Return one raw class name per pair in the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<String>, ModelError>;
}

/// Extra per-pair strings a text-level model expects next to the snippets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairContext<'a> {
    /// Snippets only.
    None,
    /// Paragraph-start flags (`"1"`/`"0"`) of the left and right span.
    ParagraphStart { x: Vec<String>, y: Vec<String> },
    /// Same-sentence flag plus the text surrounding the pair.
    Surrounding {
        same_sentence: Vec<String>,
        left: Vec<&'a str>,
        right: Vec<&'a str>,
    },
}

/// Which context columns to pass alongside the snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextColumns {
    #[default]
    None,
    ParagraphStart,
    Surrounding,
}

/// Column-major batch handed to text-level models.
#[derive(Debug, Clone)]
pub struct PairBatch<'a> {
    pub snippet_x: Vec<&'a str>,
    pub snippet_y: Vec<&'a str>,
    pub context: PairContext<'a>,
    /// Full feature rows, for ensembles that also run a tabular model.
    pub features: Option<&'a [PairFeatures]>,
}

impl<'a> PairBatch<'a> {
    /// Assemble a batch from feature rows.
    #[must_use]
    pub fn from_rows(
        rows: &'a [PairFeatures],
        columns: ContextColumns,
        with_features: bool,
    ) -> Self {
        let context = match columns {
            ContextColumns::None => PairContext::None,
            ContextColumns::ParagraphStart => PairContext::ParagraphStart {
                x: rows.iter().map(|r| flag(r.at_paragraph_start_x)).collect(),
                y: rows.iter().map(|r| flag(r.at_paragraph_start_y)).collect(),
            },
            ContextColumns::Surrounding => PairContext::Surrounding {
                same_sentence: rows.iter().map(|r| flag(r.same_sentence)).collect(),
                left: rows.iter().map(|r| r.left_context.as_str()).collect(),
                right: rows.iter().map(|r| r.right_context.as_str()).collect(),
            },
        };
        Self {
            snippet_x: rows.iter().map(|r| r.snippet_x.as_str()).collect(),
            snippet_y: rows.iter().map(|r| r.snippet_y.as_str()).collect(),
            context,
            features: with_features.then_some(rows),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snippet_x.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snippet_x.is_empty()
    }

    /// Context strings of pair `i`, in column order.
    #[must_use]
    pub fn context_of(&self, i: usize) -> Vec<&str> {
        match &self.context {
            PairContext::None => Vec::new(),
            PairContext::ParagraphStart { x, y } => [x.get(i), y.get(i)]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect(),
            PairContext::Surrounding {
                same_sentence,
                left,
                right,
            } => {
                let mut out: Vec<&str> = same_sentence.get(i).map(String::as_str).into_iter().collect();
                out.extend(left.get(i).copied());
                out.extend(right.get(i).copied());
                out
            }
        }
    }
}

/// Render a boolean feature the way models were trained to read it.
fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}
