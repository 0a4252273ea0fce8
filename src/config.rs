//! Predictor configuration types and serialisation.
//!
//! A [`Variant`] names a preset combination of relation inputs, label
//! inputs and defaults; [`PredictorConfig`] adds the static settings a
//! predictor keeps for its lifetime.

use crate::{
    heuristics::SpanPenalty,
    predictor::{DEFAULT_RELATION, PredictorSettings, RELATION_PLACEHOLDER},
    providers::ContextColumns,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};
use thiserror::Error;

/// Preset wiring of a trained-model predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Classical models; separate sentence-level and text-level relation
    /// scorers whose probabilities are summed.
    Tabular,
    /// Text-level neural relation and label models over tokenised snippets.
    Neural,
    /// Neural models that also read paragraph-start flags.
    LargeContext,
    /// Neural models that also read the same-sentence flag and the text
    /// around the pair.
    Contextual,
    /// Large-context relation scoring with a label ensemble that also reads
    /// the feature table.
    Ensemble,
    /// Ensembles for both relation scoring and labelling.
    DoubleEnsemble,
}

/// What a text-level relation model is given besides the snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelationInputs {
    pub context: ContextColumns,
    pub with_features: bool,
}

/// What a text-level label model is given and how its output is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelInputs {
    pub with_features: bool,
    /// Pass raw class names through the configured class map.
    pub remap_classes: bool,
}

impl Variant {
    /// Same-sentence bonus used when none is configured.
    #[must_use]
    pub const fn default_bonus(self) -> f32 {
        match self {
            Self::Tabular | Self::Contextual => 0.5,
            Self::Neural => 0.1,
            Self::LargeContext | Self::Ensemble | Self::DoubleEnsemble => 1.0,
        }
    }

    /// Whether relation scoring blends a sentence-level and a text-level
    /// tabular model.
    #[must_use]
    pub const fn splits_relation(self) -> bool {
        matches!(self, Self::Tabular)
    }

    /// Whether snippets are rebuilt from their tokens after extraction.
    #[must_use]
    pub const fn rejoins_tokens(self) -> bool {
        !matches!(self, Self::Tabular)
    }

    #[must_use]
    pub const fn relation_inputs(self) -> RelationInputs {
        match self {
            Self::Tabular | Self::Neural => RelationInputs {
                context: ContextColumns::None,
                with_features: false,
            },
            Self::LargeContext | Self::Ensemble => RelationInputs {
                context: ContextColumns::ParagraphStart,
                with_features: false,
            },
            Self::Contextual => RelationInputs {
                context: ContextColumns::Surrounding,
                with_features: false,
            },
            Self::DoubleEnsemble => RelationInputs {
                context: ContextColumns::ParagraphStart,
                with_features: true,
            },
        }
    }

    #[must_use]
    pub const fn label_inputs(self) -> LabelInputs {
        LabelInputs {
            with_features: matches!(self, Self::Ensemble | Self::DoubleEnsemble),
            remap_classes: matches!(self, Self::Neural),
        }
    }

    /// Label returned when no label model is configured.
    #[must_use]
    pub fn missing_label(self, default_relation: &str) -> String {
        match self {
            Self::Tabular => RELATION_PLACEHOLDER.to_string(),
            _ => default_relation.to_string(),
        }
    }
}

/// Errors returned by [`PredictorConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("same_sentence_bonus must be within [0, 1], got {0}")]
    BonusOutOfRange(f32),
    #[error("default_relation cannot be empty")]
    EmptyDefaultRelation,
}

fn default_relation() -> String {
    DEFAULT_RELATION.to_string()
}

/// Static configuration of a predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictorConfig {
    pub variant: Variant,
    /// Overrides [`Variant::default_bonus`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_sentence_bonus: Option<f32>,
    #[serde(default = "default_relation")]
    pub default_relation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub penalty_words: Vec<String>,
    /// Directory receiving extraction diagnostics; the working directory
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics_dir: Option<PathBuf>,
    /// Raw label class name to relation name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub class_map: BTreeMap<String, String>,
}

impl PredictorConfig {
    /// Configuration with every setting at the variant's default.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            same_sentence_bonus: None,
            default_relation: default_relation(),
            penalty_words: Vec::new(),
            diagnostics_dir: None,
            class_map: BTreeMap::new(),
        }
    }

    /// Ensure the configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the bonus lies outside `[0, 1]` or the default
    /// relation is empty.
    #[must_use = "Validation should not be ignored"]
    pub fn validate(self) -> Result<Self, ConfigError> {
        let bonus = self.bonus();
        if !(0.0..=1.0).contains(&bonus) {
            return Err(ConfigError::BonusOutOfRange(bonus));
        }
        if self.default_relation.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultRelation);
        }
        Ok(self)
    }

    /// Effective same-sentence bonus.
    #[must_use]
    pub fn bonus(&self) -> f32 {
        self.same_sentence_bonus
            .unwrap_or_else(|| self.variant.default_bonus())
    }

    /// Settings shared by every predictor.
    #[must_use]
    pub fn settings(&self) -> PredictorSettings {
        PredictorSettings {
            default_relation: self.default_relation.clone(),
            same_sentence_bonus: self.bonus(),
            penalty: SpanPenalty::new(&self.penalty_words),
        }
    }
}
