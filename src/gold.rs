//! Oracle predictor answering from a reference corpus of annotated pairs.
//!
//! Used to build gold trees for evaluation and training-data generation.
//! Every snippet is folded through the symbol map once, when the corpus is
//! built, and queries are folded the same way, so lookups are insensitive
//! to the substituted characters.

use crate::{
    api::{CandidatePair, DiscourseUnit, FeatureInput, FeatureTable, PairFeatures, Prediction},
    heuristics::text::fold_symbols,
    predictor::{PairPredictor, PredictError, PredictorSettings},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io::BufRead};
use thiserror::Error;

/// Nuclearity returned for pairs absent from the corpus.
pub const UNKNOWN_NUCLEARITY: &str = "_";

/// One annotated relation of the reference corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub snippet_x: String,
    pub snippet_y: String,
    /// Relation id; the relation name precedes the first underscore.
    pub category_id: String,
    /// Nuclearity order, e.g. `NS`.
    pub order: String,
}

impl CorpusRecord {
    /// Relation name joined with the record's order, e.g. `elaboration_NS`.
    #[must_use]
    pub fn label(&self) -> String {
        let relation = self
            .category_id
            .split('_')
            .next()
            .unwrap_or(self.category_id.as_str());
        format!("{relation}_{}", self.order)
    }

    fn folded(self) -> Self {
        Self {
            snippet_x: fold_symbols(&self.snippet_x),
            snippet_y: fold_symbols(&self.snippet_y),
            ..self
        }
    }
}

/// Errors raised while loading a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid corpus record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable, symbol-folded reference corpus.
///
/// When several records share a snippet pair, the first one in corpus order
/// answers every lookup.
#[derive(Debug, Clone, Default)]
pub struct GoldCorpus {
    records: Vec<CorpusRecord>,
    index: HashMap<(String, String), usize>,
}

impl GoldCorpus {
    /// Fold every record and index the first occurrence of each pair.
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = CorpusRecord>) -> Self {
        let records: Vec<CorpusRecord> = records.into_iter().map(CorpusRecord::folded).collect();
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            index
                .entry((record.snippet_x.clone(), record.snippet_y.clone()))
                .or_insert(position);
        }
        Self { records, index }
    }

    /// Load records from JSON Lines, one record per non-blank line.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError`] when reading fails or a line is not a record.
    pub fn from_jsonl(reader: impl BufRead) -> Result<Self, CorpusError> {
        let mut records = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|source| CorpusError::Parse { line: i + 1, source })?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    #[must_use]
    pub fn records(&self) -> &[CorpusRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record annotating the pair. Both snippets must already be
    /// folded.
    #[must_use]
    pub fn lookup(&self, snippet_x: &str, snippet_y: &str) -> Option<&CorpusRecord> {
        self.index
            .get(&(snippet_x.to_string(), snippet_y.to_string()))
            .and_then(|&position| self.records.get(position))
    }
}

/// Predictor answering every query from a [`GoldCorpus`].
///
/// # Examples
///
/// ```
/// use rst_predictors::api::{FeatureInput, PairFeatures, Prediction};
/// use rst_predictors::gold::{CorpusRecord, GoldCorpus, GoldPredictor};
/// use rst_predictors::PairPredictor;
///
/// let corpus = GoldCorpus::new([CorpusRecord {
///     snippet_x: "A.".into(),
///     snippet_y: "B.".into(),
///     category_id: "elaboration_NS".into(),
///     order: "NS".into(),
/// }]);
/// let predictor = GoldPredictor::new(corpus);
/// let row = PairFeatures::new("A.", "B.");
/// let label = predictor.predict_label(FeatureInput::Row(&row)).unwrap();
/// assert_eq!(label, Prediction::One("elaboration_NS".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GoldPredictor {
    corpus: GoldCorpus,
    settings: PredictorSettings,
}

impl GoldPredictor {
    #[must_use]
    pub fn new(corpus: GoldCorpus) -> Self {
        Self::with_settings(corpus, PredictorSettings::default())
    }

    #[must_use]
    pub fn with_settings(corpus: GoldCorpus, settings: PredictorSettings) -> Self {
        Self { corpus, settings }
    }

    #[must_use]
    pub fn corpus(&self) -> &GoldCorpus {
        &self.corpus
    }

    /// Folded snippets of two units as a one-row table.
    #[must_use]
    pub fn extract_features(&self, left: &DiscourseUnit, right: &DiscourseUnit) -> FeatureTable {
        FeatureTable::new(vec![folded_row(&CandidatePair::from_units(left, right))])
    }

    /// Folded snippets of every consecutive pair of units.
    #[must_use]
    pub fn initialize_features(&self, units: &[DiscourseUnit]) -> FeatureTable {
        CandidatePair::consecutive(units)
            .iter()
            .map(folded_row)
            .collect()
    }

    fn lookup_row(&self, row: &PairFeatures) -> Option<&CorpusRecord> {
        self.corpus
            .lookup(&fold_symbols(&row.snippet_x), &fold_symbols(&row.snippet_y))
    }

    fn answer<T>(
        &self,
        input: &FeatureInput<'_>,
        f: impl Fn(Option<&CorpusRecord>) -> T,
    ) -> Prediction<T> {
        match input {
            FeatureInput::Row(row) => Prediction::One(f(self.lookup_row(row))),
            FeatureInput::Batch(_) | FeatureInput::List(_) => Prediction::Many(
                input.rows().iter().map(|row| f(self.lookup_row(row))).collect(),
            ),
        }
    }
}

fn folded_row(pair: &CandidatePair) -> PairFeatures {
    PairFeatures {
        loc_x: pair.loc_x,
        loc_y: pair.loc_y,
        ..PairFeatures::new(fold_symbols(&pair.snippet_x), fold_symbols(&pair.snippet_y))
    }
}

impl PairPredictor for GoldPredictor {
    fn settings(&self) -> &PredictorSettings {
        &self.settings
    }

    /// `1.0` for pairs in the corpus, else `0.0`; the bonus does not apply.
    fn predict_pair_proba_with_bonus(
        &self,
        features: FeatureInput<'_>,
        _same_sentence_bonus: f32,
    ) -> Result<Prediction<f32>, PredictError> {
        Ok(self.answer(&features, |record| {
            if record.is_some() { 1.0 } else { 0.0 }
        }))
    }

    fn predict_label(&self, features: FeatureInput<'_>) -> Result<Prediction<String>, PredictError> {
        Ok(self.answer(&features, |record| {
            record.map_or_else(|| self.settings.default_relation.clone(), CorpusRecord::label)
        }))
    }

    fn predict_nuclearity(
        &self,
        features: FeatureInput<'_>,
    ) -> Result<Prediction<String>, PredictError> {
        Ok(self.answer(&features, |record| {
            record.map_or_else(|| UNKNOWN_NUCLEARITY.to_string(), |r| r.order.clone())
        }))
    }
}
