#![allow(dead_code, reason = "each test crate uses a subset of the helpers")]

use rst_predictors::{
    api::{AnnotatedDocument, CandidatePair, FeatureTable, PairFeatures},
    providers::{
        FeatureExtractor, ModelError, NuclearityClassifier, PairBatch, TabularLabeler,
        TabularRelationScorer, TextPairLabeler, TextPairScorer,
    },
};
use std::{cell::RefCell, rc::Rc};

#[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
#[must_use]
pub fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() < tol
}

/// Builds one row per pair; pairs are in one sentence unless the left
/// snippet ends with a full stop.
#[derive(Debug, Default)]
pub struct SnippetExtractor;

impl FeatureExtractor for SnippetExtractor {
    fn extract(
        &self,
        pairs: &[CandidatePair],
        _document: &AnnotatedDocument,
    ) -> Result<FeatureTable, ModelError> {
        Ok(pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                let mut row = PairFeatures::new(pair.snippet_x.trim(), pair.snippet_y.trim())
                    .with_same_sentence(!pair.snippet_x.trim_end().ends_with('.'));
                row.loc_x = pair.loc_x;
                row.loc_y = pair.loc_y;
                row.at_paragraph_start_x = pair.loc_x == 0;
                row.tokens_x = pair.snippet_x.split_whitespace().map(str::to_owned).collect();
                row.tokens_y = pair.snippet_y.split_whitespace().map(str::to_owned).collect();
                row.columns.insert("index".into(), f64::from(u32::try_from(i).unwrap_or(0)));
                row.columns.insert("words_x".into(), f64::from(u32::try_from(row.tokens_x.len()).unwrap_or(0)));
                row
            })
            .collect())
    }
}

/// Kind of failure raised by [`FailingExtractor`].
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    IndexOutOfRange,
    Backend,
    /// Answers with one row too few.
    ShortTable,
}

#[derive(Debug)]
pub struct FailingExtractor(pub Failure);

impl FeatureExtractor for FailingExtractor {
    fn extract(
        &self,
        pairs: &[CandidatePair],
        document: &AnnotatedDocument,
    ) -> Result<FeatureTable, ModelError> {
        match self.0 {
            Failure::IndexOutOfRange => Err(ModelError::IndexOutOfRange {
                what: "tokens",
                index: document.tokens.len() + 1,
                len: document.tokens.len(),
            }),
            Failure::Backend => Err(ModelError::backend("tagger crashed")),
            Failure::ShortTable => {
                let mut rows = SnippetExtractor.extract(pairs, document)?.into_rows();
                rows.pop();
                Ok(FeatureTable::new(rows))
            }
        }
    }
}

/// Tabular relation scorer answering the same probability for every row.
#[derive(Debug, Clone, Copy)]
pub struct FixedTabular(pub f32);

impl TabularRelationScorer for FixedTabular {
    #[expect(clippy::float_arithmetic, reason = "complementary probability")]
    fn predict_proba(&self, rows: &[PairFeatures]) -> Result<Vec<[f32; 2]>, ModelError> {
        Ok(vec![[1.0 - self.0, self.0]; rows.len()])
    }
}

/// What a text-level model saw for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenPair {
    pub snippet_x: String,
    pub snippet_y: String,
    pub context: Vec<String>,
    pub with_features: bool,
}

fn record(batch: &PairBatch<'_>, seen: &RefCell<Vec<SeenPair>>) {
    seen.borrow_mut()
        .extend((0..batch.len()).map(|i| SeenPair {
            snippet_x: batch.snippet_x.get(i).copied().unwrap_or_default().to_owned(),
            snippet_y: batch.snippet_y.get(i).copied().unwrap_or_default().to_owned(),
            context: batch.context_of(i).into_iter().map(str::to_owned).collect(),
            with_features: batch.features.is_some(),
        }));
}

/// Text-level scorer with a fixed positive probability that records its
/// inputs.
#[derive(Debug, Clone)]
pub struct RecordingScorer {
    pub positive: f32,
    pub seen: Rc<RefCell<Vec<SeenPair>>>,
}

impl RecordingScorer {
    #[must_use]
    pub fn new(positive: f32) -> Self {
        Self {
            positive,
            seen: Rc::default(),
        }
    }
}

impl TextPairScorer for RecordingScorer {
    #[expect(clippy::float_arithmetic, reason = "complementary probability")]
    fn predict_proba_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<[f32; 2]>, ModelError> {
        record(batch, &self.seen);
        Ok(vec![[1.0 - self.positive, self.positive]; batch.len()])
    }
}

/// Text-level labeller answering a fixed raw class and recording its inputs.
#[derive(Debug, Clone)]
pub struct RecordingLabeler {
    pub class: String,
    pub seen: Rc<RefCell<Vec<SeenPair>>>,
}

impl RecordingLabeler {
    #[must_use]
    pub fn new(class: &str) -> Self {
        Self {
            class: class.to_owned(),
            seen: Rc::default(),
        }
    }
}

impl TextPairLabeler for RecordingLabeler {
    fn predict_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<String>, ModelError> {
        record(batch, &self.seen);
        Ok(vec![self.class.clone(); batch.len()])
    }
}

/// Tabular labeller naming each row after its left snippet.
#[derive(Debug, Default)]
pub struct SnippetLabeler;

impl TabularLabeler for SnippetLabeler {
    fn predict(&self, rows: &[PairFeatures]) -> Result<Vec<String>, ModelError> {
        Ok(rows.iter().map(|r| format!("{}_NS", r.snippet_x)).collect())
    }
}

/// Nuclearity model answering a fixed class.
#[derive(Debug)]
pub struct FixedNuclearity(pub &'static str);

impl NuclearityClassifier for FixedNuclearity {
    fn predict(&self, rows: &[PairFeatures]) -> Result<Vec<String>, ModelError> {
        Ok(vec![self.0.to_owned(); rows.len()])
    }
}

/// Model that answers one row fewer than it was asked.
#[derive(Debug)]
pub struct DroppingScorer;

impl TextPairScorer for DroppingScorer {
    fn predict_proba_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<[f32; 2]>, ModelError> {
        Ok(vec![[0.5, 0.5]; batch.len().saturating_sub(1)])
    }
}
