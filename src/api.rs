//! Data model shared by every predictor: discourse units, candidate pairs,
//! document annotations, feature rows and the input/output shapes accepted
//! and returned by the predictor contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column name stripped from every extracted feature table.
pub const INDEX_COLUMN: &str = "index";

/// Contiguous region of the source text that forms a tree leaf.
///
/// Units carry no stable identifier; features are matched back to them by
/// their text.
///
/// # Examples
///
/// ```
/// use rst_predictors::api::DiscourseUnit;
///
/// let unit = DiscourseUnit::new(4, "it rained ");
/// assert_eq!(unit.end(), 14);
/// assert_eq!(unit.trimmed(), "it rained");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscourseUnit {
    /// Character offset of the unit in the source text.
    pub start: usize,
    /// Literal text content.
    pub text: String,
}

impl DiscourseUnit {
    /// Create a unit starting at `start`.
    #[must_use]
    pub fn new(start: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            text: text.into(),
        }
    }

    /// Offset one past the last character of the unit.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.text.chars().count()
    }

    /// Text without surrounding whitespace.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Two spans whose features the caller wants to compute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub snippet_x: String,
    pub snippet_y: String,
    pub loc_x: usize,
    pub loc_y: usize,
}

impl CandidatePair {
    /// Pair two units, trimming their text.
    #[must_use]
    pub fn from_units(left: &DiscourseUnit, right: &DiscourseUnit) -> Self {
        Self {
            snippet_x: left.trimmed().to_string(),
            snippet_y: right.trimmed().to_string(),
            loc_x: left.start,
            loc_y: right.start,
        }
    }

    /// Pair every unit with its successor.
    ///
    /// Returns an empty vector for fewer than two units.
    #[must_use]
    pub fn consecutive(units: &[DiscourseUnit]) -> Vec<Self> {
        units
            .windows(2)
            .filter_map(|window| match window {
                [left, right] => Some(Self::from_units(left, right)),
                _ => None,
            })
            .collect()
    }
}

/// A token of the annotated document with character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub begin: usize,
    pub end: usize,
}

/// A sentence expressed as a half-open range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub begin: usize,
    pub end: usize,
}

/// Dependency arc of a token; `parent` is `None` for the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub parent: Option<usize>,
    pub link_name: String,
}

/// Linguistic annotation of a whole document.
///
/// Per-sentence layers (`lemma`, `morph`, `postag`, `syntax_dep_tree`) hold
/// one entry per sentence, each with one entry per token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
    #[serde(default)]
    pub lemma: Vec<Vec<String>>,
    #[serde(default)]
    pub morph: Vec<Vec<BTreeMap<String, String>>>,
    #[serde(default)]
    pub postag: Vec<Vec<String>>,
    #[serde(default)]
    pub syntax_dep_tree: Vec<Vec<Dependency>>,
}

impl AnnotatedDocument {
    /// Document with raw text only.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Features of one candidate pair.
///
/// Both snippets live in the same row, so they are co-indexed by
/// construction. Model-specific numeric features go into `columns`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairFeatures {
    pub snippet_x: String,
    pub snippet_y: String,
    #[serde(default)]
    pub loc_x: usize,
    #[serde(default)]
    pub loc_y: usize,
    #[serde(default)]
    pub same_sentence: bool,
    #[serde(default)]
    pub same_paragraph: bool,
    #[serde(default)]
    pub at_paragraph_start_x: bool,
    #[serde(default)]
    pub at_paragraph_start_y: bool,
    #[serde(default)]
    pub left_context: String,
    #[serde(default)]
    pub right_context: String,
    #[serde(default)]
    pub tokens_x: Vec<String>,
    #[serde(default)]
    pub tokens_y: Vec<String>,
    #[serde(default)]
    pub columns: BTreeMap<String, f64>,
}

impl PairFeatures {
    /// Row holding just the two snippets.
    #[must_use]
    pub fn new(snippet_x: impl Into<String>, snippet_y: impl Into<String>) -> Self {
        Self {
            snippet_x: snippet_x.into(),
            snippet_y: snippet_y.into(),
            ..Self::default()
        }
    }

    /// Mark whether both snippets lie in one sentence.
    #[must_use]
    pub fn with_same_sentence(mut self, same_sentence: bool) -> Self {
        self.same_sentence = same_sentence;
        self
    }

    /// Copy of the row with both snippets replaced by empty strings unless
    /// `keep` holds.
    #[must_use]
    pub fn masked(&self, keep: bool) -> Self {
        if keep {
            return self.clone();
        }
        Self {
            snippet_x: String::new(),
            snippet_y: String::new(),
            ..self.clone()
        }
    }

    /// Rebuild the snippets from their tokens joined by single spaces.
    ///
    /// Rows without tokens keep their snippet.
    pub fn rejoin_tokens(&mut self) {
        if !self.tokens_x.is_empty() {
            self.snippet_x = self.tokens_x.join(" ");
        }
        if !self.tokens_y.is_empty() {
            self.snippet_y = self.tokens_y.join(" ");
        }
    }
}

/// Ordered collection of feature rows, one per candidate pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureTable {
    rows: Vec<PairFeatures>,
}

impl FeatureTable {
    #[must_use]
    pub fn new(rows: Vec<PairFeatures>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[PairFeatures] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [PairFeatures] {
        &mut self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<PairFeatures> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairFeatures> {
        self.rows.iter()
    }

    /// Remove a numeric column from every row.
    pub fn drop_column(&mut self, name: &str) {
        for row in &mut self.rows {
            row.columns.remove(name);
        }
    }

    /// Row positions that lie in one sentence.
    #[must_use]
    pub fn same_sentence_mask(&self) -> Vec<bool> {
        self.rows.iter().map(|row| row.same_sentence).collect()
    }
}

impl From<Vec<PairFeatures>> for FeatureTable {
    fn from(rows: Vec<PairFeatures>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<PairFeatures> for FeatureTable {
    fn from_iter<I: IntoIterator<Item = PairFeatures>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Shape of the features handed to a predictor.
///
/// The shape is decided once by the caller; each predictor handles every
/// variant explicitly.
#[derive(Debug, Clone, Copy)]
pub enum FeatureInput<'a> {
    /// A single candidate pair; answered with [`Prediction::One`].
    Row(&'a PairFeatures),
    /// A feature table; answered with one value per row.
    Batch(&'a FeatureTable),
    /// Loose records not assembled into a table; scored raw, one value per
    /// record.
    List(&'a [PairFeatures]),
}

impl<'a> FeatureInput<'a> {
    /// Number of candidate pairs in the input.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Row(_) => 1,
            Self::Batch(table) => table.len(),
            Self::List(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows of the input in order.
    #[must_use]
    pub fn rows(&self) -> &'a [PairFeatures] {
        match *self {
            Self::Row(row) => std::slice::from_ref(row),
            Self::Batch(table) => table.rows(),
            Self::List(rows) => rows,
        }
    }
}

impl<'a> From<&'a PairFeatures> for FeatureInput<'a> {
    fn from(row: &'a PairFeatures) -> Self {
        Self::Row(row)
    }
}

impl<'a> From<&'a FeatureTable> for FeatureInput<'a> {
    fn from(table: &'a FeatureTable) -> Self {
        Self::Batch(table)
    }
}

impl<'a> From<&'a [PairFeatures]> for FeatureInput<'a> {
    fn from(rows: &'a [PairFeatures]) -> Self {
        Self::List(rows)
    }
}

/// Output matching the shape of a [`FeatureInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Prediction<T> {
    /// Wrap per-row values in the shape of `input`.
    ///
    /// A row input takes the first value; callers guarantee exactly one.
    pub(crate) fn shaped(input: &FeatureInput<'_>, mut values: Vec<T>) -> Option<Self> {
        match input {
            FeatureInput::Row(_) => {
                if values.len() == 1 {
                    values.pop().map(Self::One)
                } else {
                    None
                }
            }
            FeatureInput::Batch(_) | FeatureInput::List(_) => Some(Self::Many(values)),
        }
    }

    /// Number of values held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a vector of values.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }

    /// The single value of a row prediction.
    #[must_use]
    pub fn one(self) -> Option<T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 1)]
    #[case(5, 4)]
    fn consecutive_pairs_cover_every_window(#[case] units: usize, #[case] expected: usize) {
        let units: Vec<DiscourseUnit> = (0..units)
            .map(|i| DiscourseUnit::new(i * 10, format!(" unit {i} ")))
            .collect();
        let pairs = CandidatePair::consecutive(&units);
        assert_eq!(pairs.len(), expected);
        for (i, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.snippet_x, format!("unit {i}"));
            assert_eq!(pair.snippet_y, format!("unit {}", i + 1));
            assert_eq!(pair.loc_y, (i + 1) * 10);
        }
    }

    #[test]
    fn masking_blanks_both_snippets() {
        let row = PairFeatures::new("a", "b").with_same_sentence(true);
        let masked = row.masked(false);
        assert_eq!(masked.snippet_x, "");
        assert_eq!(masked.snippet_y, "");
        assert!(masked.same_sentence);
        assert_eq!(row.masked(true), row);
    }

    #[test]
    fn rejoin_tokens_keeps_snippet_without_tokens() {
        let mut row = PairFeatures::new("keep me", "x");
        row.tokens_y = vec!["a".into(), "b,".into()];
        row.rejoin_tokens();
        assert_eq!(row.snippet_x, "keep me");
        assert_eq!(row.snippet_y, "a b,");
    }

    #[test]
    fn drop_column_removes_from_every_row() {
        let mut row = PairFeatures::new("a", "b");
        row.columns.insert(INDEX_COLUMN.into(), 3.0);
        row.columns.insert("len".into(), 1.0);
        let mut table = FeatureTable::new(vec![row.clone(), row]);
        table.drop_column(INDEX_COLUMN);
        assert!(table.iter().all(|r| !r.columns.contains_key(INDEX_COLUMN)));
        assert!(table.iter().all(|r| r.columns.contains_key("len")));
    }

    #[test]
    fn shaped_row_requires_exactly_one_value() {
        let row = PairFeatures::new("a", "b");
        let input = FeatureInput::Row(&row);
        assert_eq!(Prediction::shaped(&input, vec![1]), Some(Prediction::One(1)));
        assert_eq!(Prediction::shaped(&input, vec![1, 2]), None);
        let table = FeatureTable::new(vec![row.clone(), row]);
        let batch = FeatureInput::Batch(&table);
        assert_eq!(batch.len(), 2);
        assert_eq!(
            Prediction::shaped(&batch, vec![1, 2]).map(Prediction::into_vec),
            Some(vec![1, 2])
        );
    }
}
