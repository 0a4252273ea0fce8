use super::errors::OnnxPairClassifierError;

/// How the logits of a pair classifier are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputHead {
    /// Two logits (no relation, relation) turned into probabilities.
    Relation,
    /// One logit per class name; the highest logit wins.
    Classes(Vec<String>),
}

impl OutputHead {
    /// Number of logits the model must emit per pair.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Relation => 2,
            Self::Classes(names) => names.len(),
        }
    }

    /// Validates the head configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmptyClassNames` when a class head has no class names.
    pub fn validate(&self) -> Result<(), OnnxPairClassifierError> {
        match self {
            Self::Classes(names) if names.is_empty() => Err(OnnxPairClassifierError::EmptyClassNames),
            _ => Ok(()),
        }
    }

    /// Name of the class with the highest logit.
    #[must_use]
    pub fn class_of(&self, logits: &[f32]) -> Option<&str> {
        let Self::Classes(names) = self else {
            return None;
        };
        let best = logits
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)?;
        names.get(best).map(String::as_str)
    }
}

/// Softmax over two logits.
#[expect(clippy::float_arithmetic, reason = "softmax requires float operations")]
#[must_use]
pub fn binary_softmax(negative: f32, positive: f32) -> [f32; 2] {
    let max = negative.max(positive);
    let neg = (negative - max).exp();
    let pos = (positive - max).exp();
    let total = neg + pos;
    [neg / total, pos / total]
}
