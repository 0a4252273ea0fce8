//! Relation predictors for discourse-tree construction.
//!
//! A tree builder scores adjacent discourse units with a [`PairPredictor`]
//! and merges the most probable pairs. [`GoldPredictor`] answers from an
//! annotated corpus; [`ModelPredictor`] composes trained collaborators.

pub mod api;
#[cfg(feature = "provider-api")]
pub mod api_classifier;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod gold;
pub mod heuristics;
pub mod model;
pub mod predictor;
pub mod providers;

pub use api::{
    AnnotatedDocument, CandidatePair, DiscourseUnit, FeatureInput, FeatureTable, PairFeatures,
    Prediction,
};
#[cfg(feature = "provider-api")]
pub use api_classifier::{ApiPairClassifier, ApiPairClassifierError};
#[cfg(feature = "cli")]
pub use cli::RstpArgs;
pub use config::{ConfigError, PredictorConfig, Variant};
pub use gold::{CorpusRecord, GoldCorpus, GoldPredictor};
pub use model::{
    BuildError, ModelPredictor, ModelPredictorBuilder,
    diagnostics::{DiagnosticSink, ExtractionFailure},
};
pub use predictor::{PairPredictor, PredictError, PredictorSettings};
pub use providers::{
    FeatureExtractor, ModelError, NuclearityClassifier, TabularLabeler, TabularRelationScorer,
    TextPairLabeler, TextPairScorer,
};
