//! HTTP-backed pair classifier.
//!
//! Posts a batch of snippet pairs to an endpoint and expects either
//! `{"probabilities": [[neg, pos], ...]}` (relation scoring) or
//! `{"labels": [...]}` (relation labelling), one entry per pair. An optional
//! API key is sent as a bearer token.
//!
//! # Examples
//!
//! ```no_run
//! use rst_predictors::api::PairFeatures;
//! use rst_predictors::providers::{ContextColumns, PairBatch, TextPairScorer};
//! use rst_predictors::ApiPairClassifier;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scorer = ApiPairClassifier::new("http://localhost:8080/structure", None)?;
//! let rows = vec![PairFeatures::new("It rained,", "so we stayed in.")];
//! let batch = PairBatch::from_rows(&rows, ContextColumns::None, false);
//! let probabilities = scorer.predict_proba_batch(&batch)?;
//! assert_eq!(probabilities.len(), 1);
//! # Ok(())
//! # }
//! ```

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::api::PairFeatures;
use crate::providers::{ModelError, PairBatch, TextPairLabeler, TextPairScorer};

/// Error returned by [`ApiPairClassifier`].
#[derive(Debug, Error)]
pub enum ApiPairClassifierError {
    /// HTTP client could not be built or the request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response body did not have the expected shape.
    #[error("invalid response")]
    InvalidResponse,
    /// Response had the wrong number of answers.
    #[error("endpoint answered {actual} pairs but {expected} were sent")]
    Count { expected: usize, actual: usize },
}

impl PartialEq for ApiPairClassifierError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Request(_), Self::Request(_))
            | (Self::InvalidResponse, Self::InvalidResponse) => true,
            (
                Self::Count { expected, actual },
                Self::Count {
                    expected: e,
                    actual: a,
                },
            ) => expected == e && actual == a,
            _ => false,
        }
    }
}

impl Eq for ApiPairClassifierError {}

#[derive(Serialize)]
struct PairRequest<'a> {
    snippet_x: &'a str,
    snippet_y: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    context: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<&'a PairFeatures>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    pairs: Vec<PairRequest<'a>>,
}

#[derive(Deserialize)]
struct ProbabilityResponse {
    probabilities: Vec<[f32; 2]>,
}

#[derive(Deserialize)]
struct LabelResponse {
    labels: Vec<String>,
}

/// Relation scorer or labeller served over HTTP.
#[derive(Debug, Clone)]
pub struct ApiPairClassifier {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl ApiPairClassifier {
    /// Create a classifier for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiPairClassifierError::Request`] if the HTTP client cannot
    /// be constructed.
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, ApiPairClassifierError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }

    /// Relation probabilities for every pair of the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    pub fn probabilities(
        &self,
        batch: &PairBatch<'_>,
    ) -> Result<Vec<[f32; 2]>, ApiPairClassifierError> {
        let body: ProbabilityResponse = self.post(batch)?;
        if !body
            .probabilities
            .iter()
            .flatten()
            .all(|p| p.is_finite() && (0.0..=1.0).contains(p))
        {
            return Err(ApiPairClassifierError::InvalidResponse);
        }
        check_count(batch.len(), body.probabilities)
    }

    /// Relation class names for every pair of the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    pub fn labels(&self, batch: &PairBatch<'_>) -> Result<Vec<String>, ApiPairClassifierError> {
        let body: LabelResponse = self.post(batch)?;
        check_count(batch.len(), body.labels)
    }

    fn post<T: for<'de> Deserialize<'de>>(
        &self,
        batch: &PairBatch<'_>,
    ) -> Result<T, ApiPairClassifierError> {
        let pairs = batch
            .snippet_x
            .iter()
            .zip(&batch.snippet_y)
            .enumerate()
            .map(|(i, (x, y))| PairRequest {
                snippet_x: x,
                snippet_y: y,
                context: batch.context_of(i),
                features: batch.features.and_then(|rows| rows.get(i)),
            })
            .collect();
        let mut req = self
            .client
            .post(&self.url)
            .json(&BatchRequest { pairs });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send()?.error_for_status()?;
        resp.json()
            .map_err(|_| ApiPairClassifierError::InvalidResponse)
    }
}

fn check_count<T>(expected: usize, values: Vec<T>) -> Result<Vec<T>, ApiPairClassifierError> {
    if values.len() == expected {
        Ok(values)
    } else {
        Err(ApiPairClassifierError::Count {
            expected,
            actual: values.len(),
        })
    }
}

impl TextPairScorer for ApiPairClassifier {
    fn predict_proba_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<[f32; 2]>, ModelError> {
        self.probabilities(batch).map_err(ModelError::backend)
    }
}

impl TextPairLabeler for ApiPairClassifier {
    fn predict_batch(&self, batch: &PairBatch<'_>) -> Result<Vec<String>, ModelError> {
        self.labels(batch).map_err(ModelError::backend)
    }
}
