//! Penalty heuristic for spans that are unlikely to be elementary.
//!
//! A span is flagged when it is very long or mentions one of the configured
//! penalty words. Tree builders use the flag to condition merge scores.

use crate::heuristics::text::word_count;
use serde::{Deserialize, Serialize};

/// Word count above which a span is penalised.
pub const MAX_ELEMENTARY_WORDS: usize = 100;

/// Default penalty returned for flagged spans.
pub const DEFAULT_PENALTY: f32 = 0.5;

/// Flags spans that look non-elementary.
///
/// # Examples
///
/// ```
/// use rst_predictors::heuristics::SpanPenalty;
///
/// let penalty = SpanPenalty::new(["however"]);
/// assert_eq!(penalty.score("However, it rained.", 0.5), 0.5);
/// assert_eq!(penalty.score("It rained.", 0.5), 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanPenalty {
    words: Vec<String>,
}

impl SpanPenalty {
    /// Build the heuristic from penalty words; matching ignores case.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Lower-cased penalty words.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Return `penalty` for a flagged span, otherwise `0.0`.
    #[must_use]
    pub fn score(&self, span: &str, penalty: f32) -> f32 {
        if word_count(span) > MAX_ELEMENTARY_WORDS {
            return penalty;
        }
        let lower = span.to_lowercase();
        if self.words.iter().any(|word| lower.contains(word.as_str())) {
            penalty
        } else {
            0.0
        }
    }
}
