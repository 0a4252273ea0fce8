//! The contract shared by every relation predictor.

use crate::{
    api::{FeatureInput, Prediction},
    heuristics::{SpanPenalty, penalty::DEFAULT_PENALTY},
    providers::ModelError,
};
use thiserror::Error;

/// Relation used when nothing better is known.
pub const DEFAULT_RELATION: &str = "joint_NN";

/// Label returned by tabular predictors without a label model.
pub const RELATION_PLACEHOLDER: &str = "relation";

/// Nuclearity returned when no nuclearity model is configured.
pub const NUCLEARITY_UNAVAILABLE: &str = "unavail";

/// Errors returned while scoring or labelling candidate pairs.
#[derive(Debug, Error)]
pub enum PredictError {
    /// A collaborator model failed or broke the row contract.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Static configuration shared by predictors.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorSettings {
    /// Label returned when no other label is available.
    pub default_relation: String,
    /// Added to the relation score of pairs within one sentence.
    pub same_sentence_bonus: f32,
    /// Heuristic for spans that are probably not elementary.
    pub penalty: SpanPenalty,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            default_relation: DEFAULT_RELATION.to_string(),
            same_sentence_bonus: 0.0,
            penalty: SpanPenalty::default(),
        }
    }
}

/// Scores, labels and orients candidate pairs for tree assembly.
///
/// For a row input every method returns [`Prediction::One`]; for a batch or
/// list of N pairs it returns N values in input order.
pub trait PairPredictor {
    /// Settings this predictor was built with.
    fn settings(&self) -> &PredictorSettings;

    /// Score pairs with an explicit same-sentence bonus.
    ///
    /// # Errors
    ///
    /// Returns an error if a relation model fails.
    fn predict_pair_proba_with_bonus(
        &self,
        features: FeatureInput<'_>,
        same_sentence_bonus: f32,
    ) -> Result<Prediction<f32>, PredictError>;

    /// Score pairs with the configured same-sentence bonus.
    ///
    /// # Errors
    ///
    /// Returns an error if a relation model fails.
    fn predict_pair_proba(
        &self,
        features: FeatureInput<'_>,
    ) -> Result<Prediction<f32>, PredictError> {
        self.predict_pair_proba_with_bonus(features, self.settings().same_sentence_bonus)
    }

    /// Predict the relation label of each pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the label model fails.
    fn predict_label(&self, features: FeatureInput<'_>) -> Result<Prediction<String>, PredictError>;

    /// Predict the nuclearity of each pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the nuclearity model fails.
    fn predict_nuclearity(
        &self,
        features: FeatureInput<'_>,
    ) -> Result<Prediction<String>, PredictError>;

    /// Penalty for a span that is likely not elementary, or `0.0`.
    fn penalty_for_span(&self, span: &str, penalty: f32) -> f32 {
        self.settings().penalty.score(span, penalty)
    }

    /// [`Self::penalty_for_span`] with the default penalty of `0.5`.
    fn default_penalty_for_span(&self, span: &str) -> f32 {
        self.penalty_for_span(span, DEFAULT_PENALTY)
    }
}

/// Shape `values` like `input`, failing if a row input got other than one.
pub(crate) fn shape<T>(
    input: &FeatureInput<'_>,
    values: Vec<T>,
) -> Result<Prediction<T>, PredictError> {
    let actual = values.len();
    Prediction::shaped(input, values).ok_or_else(|| {
        PredictError::Model(ModelError::RowCount {
            expected: input.len(),
            actual,
        })
    })
}

/// The same value for every pair of `input`.
pub(crate) fn constant<T: Clone>(input: &FeatureInput<'_>, value: T) -> Prediction<T> {
    match input {
        FeatureInput::Row(_) => Prediction::One(value),
        FeatureInput::Batch(_) | FeatureInput::List(_) => {
            Prediction::Many(vec![value; input.len()])
        }
    }
}
