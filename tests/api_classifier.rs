#![cfg(feature = "provider-api")] // Gate tests on provider-api feature
use httpmock::{Method::POST, MockServer};
use rst_predictors::{
    ApiPairClassifier, ApiPairClassifierError, ModelPredictorBuilder, PairPredictor,
    api::{FeatureInput, PairFeatures, Prediction},
    config::{PredictorConfig, Variant},
    providers::{ContextColumns, PairBatch},
};
use rstest::*;

mod support;

#[fixture]
fn mock_server() -> MockServer {
    MockServer::start()
}

fn classifier(server: &MockServer, key: Option<&str>) -> ApiPairClassifier {
    ApiPairClassifier::new(format!("{}/pairs", server.base_url()), key.map(str::to_owned))
        .unwrap_or_else(|e| panic!("build classifier: {e}"))
}

fn rows() -> Vec<PairFeatures> {
    let mut first = PairFeatures::new("It rained,", "so we stayed in.");
    first.at_paragraph_start_x = true;
    vec![first, PairFeatures::new("Later", "it cleared.")]
}

#[rstest]
fn posts_snippets_and_context(mock_server: MockServer) {
    let mock = mock_server.mock(|when, then| {
        when.method(POST)
            .path("/pairs")
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "pairs": [
                    {"snippet_x": "It rained,", "snippet_y": "so we stayed in.", "context": ["1", "0"]},
                    {"snippet_x": "Later", "snippet_y": "it cleared.", "context": ["0", "0"]}
                ]
            }));
        then.status(200)
            .json_body(serde_json::json!({ "probabilities": [[0.2, 0.8], [0.9, 0.1]] }));
    });
    let rows = rows();
    let batch = PairBatch::from_rows(&rows, ContextColumns::ParagraphStart, false);
    let probabilities = classifier(&mock_server, None)
        .probabilities(&batch)
        .unwrap_or_else(|e| panic!("classifier error: {e}"));
    mock.assert();
    assert_eq!(probabilities, vec![[0.2, 0.8], [0.9, 0.1]]);
}

#[rstest]
fn sends_bearer_token_and_reads_labels(mock_server: MockServer) {
    mock_server.mock(|when, then| {
        when.method(POST)
            .path("/pairs")
            .header("authorization", "Bearer secret");
        then.status(200)
            .json_body(serde_json::json!({ "labels": ["elaboration_NS", "joint_NN"] }));
    });
    let rows = rows();
    let batch = PairBatch::from_rows(&rows, ContextColumns::None, false);
    let labels = classifier(&mock_server, Some("secret"))
        .labels(&batch)
        .unwrap_or_else(|e| panic!("classifier error: {e}"));
    assert_eq!(labels, vec!["elaboration_NS", "joint_NN"]);
}

#[derive(Clone, Copy, Debug)]
enum ExpectedError {
    Request,
    InvalidResponse,
    Count,
}

#[rstest]
#[case(500, serde_json::json!({}), ExpectedError::Request)]
#[case(200, serde_json::json!({ "oops": true }), ExpectedError::InvalidResponse)]
#[case(
    200,
    serde_json::json!({ "probabilities": [[0.5, 1.5], [0.5, 0.5]] }),
    ExpectedError::InvalidResponse
)]
#[case(200, serde_json::json!({ "probabilities": [[0.5, 0.5]] }), ExpectedError::Count)]
fn reports_bad_answers(
    #[case] status: u16,
    #[case] body: serde_json::Value,
    #[case] expected: ExpectedError,
    mock_server: MockServer,
) {
    mock_server.mock(|when, then| {
        when.method(POST).path("/pairs");
        then.status(status).json_body(body);
    });
    let rows = rows();
    let batch = PairBatch::from_rows(&rows, ContextColumns::None, false);
    let err = match classifier(&mock_server, None).probabilities(&batch) {
        Ok(p) => panic!("expected {expected:?}, got {p:?}"),
        Err(e) => e,
    };
    match expected {
        ExpectedError::Request => assert!(matches!(err, ApiPairClassifierError::Request(_))),
        ExpectedError::InvalidResponse => {
            assert_eq!(err, ApiPairClassifierError::InvalidResponse);
        }
        ExpectedError::Count => assert_eq!(
            err,
            ApiPairClassifierError::Count {
                expected: 2,
                actual: 1
            }
        ),
    }
}

#[rstest]
fn drives_a_model_predictor(mock_server: MockServer) {
    mock_server.mock(|when, then| {
        when.method(POST).path("/pairs");
        then.status(200)
            .json_body(serde_json::json!({ "probabilities": [[0.6, 0.4]] }));
    });
    let predictor = ModelPredictorBuilder::new(PredictorConfig::new(Variant::LargeContext))
        .extractor(support::SnippetExtractor)
        .text_relation(classifier(&mock_server, None))
        .build()
        .unwrap_or_else(|e| panic!("build predictor: {e}"));
    let row = PairFeatures::new("a", "b").with_same_sentence(true);
    let score = predictor
        .predict_pair_proba(FeatureInput::Row(&row))
        .ok()
        .and_then(Prediction::one)
        .unwrap_or_else(|| panic!("row score"));
    assert!(support::approx_eq(score, 1.4, 1e-6));
}
