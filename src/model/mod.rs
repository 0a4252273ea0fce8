//! Live-inference predictor assembled from trained collaborators.
//!
//! A [`ModelPredictor`] wires a feature extractor, relation model(s) and
//! optional label and nuclearity models according to a [`Variant`]. The
//! variant decides which context columns reach the text-level models and
//! which defaults apply; any combination can also be wired by hand through
//! [`ModelPredictorBuilder`].

pub mod diagnostics;

pub use diagnostics::{DiagnosticSink, ExtractionFailure};

use crate::{
    api::{
        AnnotatedDocument, CandidatePair, DiscourseUnit, FeatureInput, FeatureTable, INDEX_COLUMN,
        PairFeatures, Prediction,
    },
    config::{ConfigError, LabelInputs, PredictorConfig, RelationInputs, Variant},
    predictor::{NUCLEARITY_UNAVAILABLE, PairPredictor, PredictError, PredictorSettings, constant, shape},
    providers::{
        ContextColumns, FeatureExtractor, ModelError, NuclearityClassifier, PairBatch,
        TabularLabeler, TabularRelationScorer, TextPairLabeler, TextPairScorer,
    },
};
use diagnostics::{ERRORS_LOG, FEATURE_EXTRACTOR_ERRORS_LOG};
use std::{collections::BTreeMap, fmt, slice};
use thiserror::Error;
use tracing::{debug, warn};

/// Relation model(s) of a predictor.
pub enum RelationModels {
    /// Sentence-level and text-level tabular models voting jointly.
    Split {
        sentence: Box<dyn TabularRelationScorer>,
        text: Box<dyn TabularRelationScorer>,
    },
    /// One text-level model reading snippets and context strings.
    TextPair(Box<dyn TextPairScorer>),
}

impl RelationModels {
    fn shape_name(&self) -> &'static str {
        match self {
            Self::Split { .. } => "split tabular",
            Self::TextPair(_) => "text pair",
        }
    }
}

/// Label model of a predictor.
pub enum LabelModel {
    Tabular(Box<dyn TabularLabeler>),
    TextPair(Box<dyn TextPairLabeler>),
}

/// Maps raw label classes onto relation names; unknown classes pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMapper {
    classes: BTreeMap<String, String>,
}

impl ClassMapper {
    #[must_use]
    pub fn new(classes: BTreeMap<String, String>) -> Self {
        Self { classes }
    }

    /// Mapped name of `raw`, or `raw` itself when unmapped or mapped to an
    /// empty name.
    #[must_use]
    pub fn map(&self, raw: String) -> String {
        match self.classes.get(&raw) {
            Some(mapped) if !mapped.is_empty() => mapped.clone(),
            _ => raw,
        }
    }
}

/// Errors returned by [`ModelPredictorBuilder::build`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("a feature extractor is required")]
    MissingExtractor,
    #[error("a relation model is required")]
    MissingRelationModel,
    #[error("variant {variant:?} expects a {expected} relation model but got {actual}")]
    RelationShape {
        variant: Variant,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Collects collaborators for a [`ModelPredictor`].
///
/// # Examples
///
/// ```
/// use rst_predictors::api::{AnnotatedDocument, CandidatePair, FeatureTable, PairFeatures};
/// use rst_predictors::config::{PredictorConfig, Variant};
/// use rst_predictors::model::ModelPredictorBuilder;
/// use rst_predictors::providers::{FeatureExtractor, ModelError, PairBatch, TextPairScorer};
///
/// struct Snippets;
/// impl FeatureExtractor for Snippets {
///     fn extract(&self, pairs: &[CandidatePair], _: &AnnotatedDocument) -> Result<FeatureTable, ModelError> {
///         Ok(pairs.iter().map(|p| PairFeatures::new(&p.snippet_x, &p.snippet_y)).collect())
///     }
/// }
///
/// struct Even;
/// impl TextPairScorer for Even {
///     fn predict_proba_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<[f32; 2]>, ModelError> {
///         Ok(vec![[0.5, 0.5]; batch.len()])
///     }
/// }
///
/// let predictor = ModelPredictorBuilder::new(PredictorConfig::new(Variant::Neural))
///     .extractor(Snippets)
///     .text_relation(Even)
///     .build()
///     .unwrap();
/// assert_eq!(predictor.variant(), Variant::Neural);
/// ```
pub struct ModelPredictorBuilder {
    config: PredictorConfig,
    extractor: Option<Box<dyn FeatureExtractor>>,
    relation: Option<RelationModels>,
    label: Option<LabelModel>,
    nuclearity: Option<Box<dyn NuclearityClassifier>>,
    relation_inputs: RelationInputs,
    label_inputs: LabelInputs,
}

impl ModelPredictorBuilder {
    /// Start from a configuration; inputs follow its variant's preset.
    #[must_use]
    pub fn new(config: PredictorConfig) -> Self {
        let variant = config.variant;
        Self {
            config,
            extractor: None,
            relation: None,
            label: None,
            nuclearity: None,
            relation_inputs: variant.relation_inputs(),
            label_inputs: variant.label_inputs(),
        }
    }

    #[must_use]
    pub fn extractor(mut self, extractor: impl FeatureExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    #[must_use]
    pub fn split_relation(
        mut self,
        sentence: impl TabularRelationScorer + 'static,
        text: impl TabularRelationScorer + 'static,
    ) -> Self {
        self.relation = Some(RelationModels::Split {
            sentence: Box::new(sentence),
            text: Box::new(text),
        });
        self
    }

    #[must_use]
    pub fn text_relation(mut self, model: impl TextPairScorer + 'static) -> Self {
        self.relation = Some(RelationModels::TextPair(Box::new(model)));
        self
    }

    #[must_use]
    pub fn tabular_labels(mut self, model: impl TabularLabeler + 'static) -> Self {
        self.label = Some(LabelModel::Tabular(Box::new(model)));
        self
    }

    #[must_use]
    pub fn text_labels(mut self, model: impl TextPairLabeler + 'static) -> Self {
        self.label = Some(LabelModel::TextPair(Box::new(model)));
        self
    }

    #[must_use]
    pub fn nuclearity(mut self, model: impl NuclearityClassifier + 'static) -> Self {
        self.nuclearity = Some(Box::new(model));
        self
    }

    /// Override the variant's relation inputs.
    #[must_use]
    pub fn relation_inputs(mut self, inputs: RelationInputs) -> Self {
        self.relation_inputs = inputs;
        self
    }

    /// Override the variant's label inputs.
    #[must_use]
    pub fn label_inputs(mut self, inputs: LabelInputs) -> Self {
        self.label_inputs = inputs;
        self
    }

    /// Validate the configuration and assemble the predictor.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the configuration is invalid, a required
    /// collaborator is missing, or the relation model does not fit the
    /// variant.
    pub fn build(self) -> Result<ModelPredictor, BuildError> {
        let config = self.config.validate()?;
        let extractor = self.extractor.ok_or(BuildError::MissingExtractor)?;
        let relation = self.relation.ok_or(BuildError::MissingRelationModel)?;
        let fits = matches!(relation, RelationModels::Split { .. }) == config.variant.splits_relation();
        if !fits {
            return Err(BuildError::RelationShape {
                variant: config.variant,
                expected: if config.variant.splits_relation() {
                    "split tabular"
                } else {
                    "text pair"
                },
                actual: relation.shape_name(),
            });
        }
        let diagnostics = config
            .diagnostics_dir
            .clone()
            .map_or_else(DiagnosticSink::default, |dir| DiagnosticSink::new(dir));
        Ok(ModelPredictor {
            variant: config.variant,
            settings: config.settings(),
            class_mapper: ClassMapper::new(config.class_map),
            extractor,
            relation,
            relation_inputs: self.relation_inputs,
            label: self.label,
            label_inputs: self.label_inputs,
            nuclearity: self.nuclearity,
            diagnostics,
        })
    }
}

/// Predictor backed by trained models.
pub struct ModelPredictor {
    variant: Variant,
    settings: PredictorSettings,
    class_mapper: ClassMapper,
    extractor: Box<dyn FeatureExtractor>,
    relation: RelationModels,
    relation_inputs: RelationInputs,
    label: Option<LabelModel>,
    label_inputs: LabelInputs,
    nuclearity: Option<Box<dyn NuclearityClassifier>>,
    diagnostics: DiagnosticSink,
}

impl fmt::Debug for ModelPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPredictor")
            .field("variant", &self.variant)
            .field("settings", &self.settings)
            .field("relation", &self.relation.shape_name())
            .field("relation_inputs", &self.relation_inputs)
            .field("has_label_model", &self.label.is_some())
            .field("has_nuclearity_model", &self.nuclearity.is_some())
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl ModelPredictor {
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    /// Features of a single pair of units.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionFailure`] if the extractor fails; the pair and
    /// the document text are also written to `errors.log`.
    pub fn extract_features(
        &self,
        left: &DiscourseUnit,
        right: &DiscourseUnit,
        document: &AnnotatedDocument,
    ) -> Result<FeatureTable, ExtractionFailure> {
        let pairs = vec![CandidatePair::from_units(left, right)];
        match self.run_extractor(&pairs, document) {
            Ok(table) => Ok(table),
            Err(source) => {
                let diagnostic = self.diagnostics.record(ERRORS_LOG, &pairs, &document.text);
                warn!(error = %source, "feature extraction failed for pair");
                Err(ExtractionFailure {
                    pairs,
                    source,
                    diagnostic,
                })
            }
        }
    }

    /// Features of every consecutive pair of units, in one extractor call.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionFailure`] if the extractor fails. Index-range
    /// failures also write `feature_extractor_errors.log`.
    pub fn initialize_features(
        &self,
        units: &[DiscourseUnit],
        document: &AnnotatedDocument,
    ) -> Result<FeatureTable, ExtractionFailure> {
        let pairs = CandidatePair::consecutive(units);
        if pairs.is_empty() {
            return Ok(FeatureTable::default());
        }
        match self.run_extractor(&pairs, document) {
            Ok(table) => Ok(table),
            Err(source) => {
                let diagnostic = matches!(source, ModelError::IndexOutOfRange { .. })
                    .then(|| {
                        self.diagnostics
                            .record(FEATURE_EXTRACTOR_ERRORS_LOG, &pairs, &document.text)
                    })
                    .flatten();
                warn!(pairs = pairs.len(), error = %source, "feature extraction failed for document");
                Err(ExtractionFailure {
                    pairs,
                    source,
                    diagnostic,
                })
            }
        }
    }

    fn run_extractor(
        &self,
        pairs: &[CandidatePair],
        document: &AnnotatedDocument,
    ) -> Result<FeatureTable, ModelError> {
        let mut table = self.extractor.extract(pairs, document)?;
        if table.len() != pairs.len() {
            return Err(ModelError::RowCount {
                expected: pairs.len(),
                actual: table.len(),
            });
        }
        table.drop_column(INDEX_COLUMN);
        if self.variant.rejoins_tokens() {
            for row in table.rows_mut() {
                row.rejoin_tokens();
            }
        }
        Ok(table)
    }

    fn split_proba(
        sentence: &dyn TabularRelationScorer,
        text: &dyn TabularRelationScorer,
        table: &FeatureTable,
        bonus: f32,
    ) -> Result<Vec<f32>, ModelError> {
        let same = table.same_sentence_mask();
        let sentence_rows: Vec<PairFeatures> = table.iter().map(|r| r.masked(r.same_sentence)).collect();
        let text_rows: Vec<PairFeatures> = table.iter().map(|r| r.masked(!r.same_sentence)).collect();
        let sentence_level = ModelError::ensure_rows(table.len(), sentence.predict_proba(&sentence_rows)?)?;
        let text_level = ModelError::ensure_rows(table.len(), text.predict_proba(&text_rows)?)?;
        Ok(sentence_level
            .iter()
            .zip(&text_level)
            .zip(same)
            .map(|((s, t), same)| vote(s[1], t[1], same, bonus))
            .collect())
    }

    fn text_pair_proba(
        &self,
        model: &dyn TextPairScorer,
        rows: &[PairFeatures],
        bonus: Option<f32>,
    ) -> Result<Vec<f32>, ModelError> {
        let batch = PairBatch::from_rows(
            rows,
            self.relation_inputs.context,
            self.relation_inputs.with_features,
        );
        let probas = ModelError::ensure_rows(rows.len(), model.predict_proba_batch(&batch)?)?;
        Ok(probas
            .iter()
            .zip(rows)
            .map(|(p, row)| match bonus {
                Some(bonus) => add_bonus(p[1], row.same_sentence, bonus),
                None => p[1],
            })
            .collect())
    }
}

#[expect(clippy::float_arithmetic, reason = "additive same-sentence bonus")]
fn add_bonus(score: f32, same_sentence: bool, bonus: f32) -> f32 {
    if same_sentence { score + bonus } else { score }
}

/// Sentence-level and text-level models vote by summing their positive
/// probabilities.
#[expect(clippy::float_arithmetic, reason = "summing model votes")]
fn vote(sentence_level: f32, text_level: f32, same_sentence: bool, bonus: f32) -> f32 {
    add_bonus(sentence_level, same_sentence, bonus) + text_level
}

fn positive(probas: &[[f32; 2]]) -> Vec<f32> {
    probas.iter().map(|p| p[1]).collect()
}

impl PairPredictor for ModelPredictor {
    fn settings(&self) -> &PredictorSettings {
        &self.settings
    }

    fn predict_pair_proba_with_bonus(
        &self,
        features: FeatureInput<'_>,
        same_sentence_bonus: f32,
    ) -> Result<Prediction<f32>, PredictError> {
        debug!(variant = ?self.variant, pairs = features.len(), "scoring relation");
        let scores = match (&self.relation, features) {
            (RelationModels::Split { sentence, text }, FeatureInput::Batch(table)) => {
                Self::split_proba(sentence.as_ref(), text.as_ref(), table, same_sentence_bonus)?
            }
            (RelationModels::Split { sentence, text }, FeatureInput::Row(row)) => {
                let rows = slice::from_ref(row);
                if row.same_sentence {
                    let probas = ModelError::ensure_rows(1, sentence.predict_proba(rows)?)?;
                    probas
                        .iter()
                        .map(|p| add_bonus(p[1], true, same_sentence_bonus))
                        .collect()
                } else {
                    positive(&ModelError::ensure_rows(1, text.predict_proba(rows)?)?)
                }
            }
            (RelationModels::Split { text, .. }, FeatureInput::List(rows)) => {
                positive(&ModelError::ensure_rows(rows.len(), text.predict_proba(rows)?)?)
            }
            (RelationModels::TextPair(model), FeatureInput::Batch(_) | FeatureInput::Row(_)) => {
                self.text_pair_proba(model.as_ref(), features.rows(), Some(same_sentence_bonus))?
            }
            (RelationModels::TextPair(model), FeatureInput::List(rows)) => {
                self.text_pair_proba(model.as_ref(), rows, None)?
            }
        };
        shape(&features, scores)
    }

    fn predict_label(&self, features: FeatureInput<'_>) -> Result<Prediction<String>, PredictError> {
        let rows = features.rows();
        let labels = match &self.label {
            None => {
                return Ok(constant(
                    &features,
                    self.variant.missing_label(&self.settings.default_relation),
                ));
            }
            Some(LabelModel::Tabular(model)) => ModelError::ensure_rows(rows.len(), model.predict(rows)?)?,
            Some(LabelModel::TextPair(model)) => {
                let batch = PairBatch::from_rows(rows, ContextColumns::None, self.label_inputs.with_features);
                let raw = ModelError::ensure_rows(rows.len(), model.predict_batch(&batch)?)?;
                if self.label_inputs.remap_classes {
                    raw.into_iter().map(|label| self.class_mapper.map(label)).collect()
                } else {
                    raw
                }
            }
        };
        shape(&features, labels)
    }

    fn predict_nuclearity(
        &self,
        features: FeatureInput<'_>,
    ) -> Result<Prediction<String>, PredictError> {
        let Some(model) = &self.nuclearity else {
            return Ok(constant(&features, NUCLEARITY_UNAVAILABLE.to_string()));
        };
        let rows = features.rows();
        let values = ModelError::ensure_rows(rows.len(), model.predict(rows)?)?;
        shape(&features, values)
    }
}
