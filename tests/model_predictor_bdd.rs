//! BDD tests for trained-model predictors.

mod support;

use rst_predictors::{
    ModelPredictor, ModelPredictorBuilder, PairPredictor,
    api::{FeatureInput, PairFeatures, Prediction},
    config::{PredictorConfig, Variant},
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use support::{FixedTabular, RecordingScorer, SnippetExtractor, approx_eq};

#[derive(Default)]
struct TestContext {
    predictor: RefCell<Option<ModelPredictor>>,
    score: RefCell<Option<f32>>,
    label: RefCell<Option<String>>,
}

#[fixture]
fn test_context() -> TestContext {
    TestContext::default()
}

fn set(ctx: &TestContext, builder: ModelPredictorBuilder) {
    let predictor = builder
        .build()
        .unwrap_or_else(|e| panic!("build predictor: {e}"));
    ctx.predictor.replace(Some(predictor));
}

#[given("a neural predictor scoring {positive:f32}")]
fn given_neural(positive: f32, #[from(test_context)] ctx: &TestContext) {
    set(
        ctx,
        ModelPredictorBuilder::new(PredictorConfig::new(Variant::Neural))
            .extractor(SnippetExtractor)
            .text_relation(RecordingScorer::new(positive)),
    );
}

#[given("a tabular predictor without a label model")]
fn given_tabular(#[from(test_context)] ctx: &TestContext) {
    set(
        ctx,
        ModelPredictorBuilder::new(PredictorConfig::new(Variant::Tabular))
            .extractor(SnippetExtractor)
            .split_relation(FixedTabular(0.5), FixedTabular(0.5)),
    );
}

fn score(ctx: &TestContext, same_sentence: bool, bonus: f32) {
    let binding = ctx.predictor.borrow();
    let predictor = binding
        .as_ref()
        .unwrap_or_else(|| panic!("predictor to be set"));
    let row = PairFeatures::new("it rained", "so we stayed in").with_same_sentence(same_sentence);
    let value = predictor
        .predict_pair_proba_with_bonus(FeatureInput::Row(&row), bonus)
        .ok()
        .and_then(Prediction::one);
    ctx.score.replace(value);
}

#[when("scoring a same-sentence pair with bonus {bonus:f32}")]
fn when_same_sentence(bonus: f32, #[from(test_context)] ctx: &TestContext) {
    score(ctx, true, bonus);
}

#[when("scoring a cross-sentence pair with bonus {bonus:f32}")]
fn when_cross_sentence(bonus: f32, #[from(test_context)] ctx: &TestContext) {
    score(ctx, false, bonus);
}

#[when("labelling a pair")]
fn when_labelling(#[from(test_context)] ctx: &TestContext) {
    let binding = ctx.predictor.borrow();
    let predictor = binding
        .as_ref()
        .unwrap_or_else(|| panic!("predictor to be set"));
    let row = PairFeatures::new("a", "b");
    let label = predictor
        .predict_label(FeatureInput::Row(&row))
        .ok()
        .and_then(Prediction::one);
    ctx.label.replace(label);
}

#[then("the score is {expected:f32}")]
fn then_score(expected: f32, #[from(test_context)] ctx: &TestContext) {
    let score = ctx
        .score
        .borrow()
        .unwrap_or_else(|| panic!("score to be set"));
    assert!(approx_eq(score, expected, 1e-6));
}

#[then("the label is {expected}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "BDD macro injects owned value"
)]
fn then_label(expected: String, #[from(test_context)] ctx: &TestContext) {
    assert_eq!(ctx.label.borrow().as_deref(), Some(expected.as_str()));
}

#[scenario(path = "tests/features/model_predictor.feature", index = 0)]
fn same_sentence_bonus(test_context: TestContext) {
    let _ = test_context;
}

#[scenario(path = "tests/features/model_predictor.feature", index = 1)]
fn cross_sentence_unchanged(test_context: TestContext) {
    let _ = test_context;
}

#[scenario(path = "tests/features/model_predictor.feature", index = 2)]
fn tabular_placeholder_label(test_context: TestContext) {
    let _ = test_context;
}
