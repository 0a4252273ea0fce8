use rst_predictors::{
    CorpusRecord, GoldCorpus, GoldPredictor, PairPredictor, PredictorSettings,
    api::{DiscourseUnit, FeatureInput, PairFeatures, Prediction},
};
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

const CORPUS_JSONL: &str = include_str!("golden/gold_corpus.jsonl");
const ANSWERS_JSONL: &str = include_str!("golden/gold_answers.jsonl");

#[derive(Deserialize)]
struct GoldenAnswer {
    id: u32,
    query: (String, String),
    snippet_x: String,
    proba: f32,
    relation: String,
    nuclearity: String,
}

fn predictor() -> Result<GoldPredictor, Box<dyn Error>> {
    Ok(GoldPredictor::new(GoldCorpus::from_jsonl(CORPUS_JSONL.as_bytes())?))
}

#[test]
fn golden_answers() -> Result<(), Box<dyn Error>> {
    let predictor = predictor()?;
    assert_eq!(predictor.corpus().len(), 5);
    for line in ANSWERS_JSONL.lines() {
        let expected: GoldenAnswer = from_str(line)?;
        let left = DiscourseUnit::new(0, expected.query.0.as_str());
        let right = DiscourseUnit::new(100, expected.query.1.as_str());
        let features = predictor.extract_features(&left, &right);
        let input = FeatureInput::Batch(&features);
        assert_eq!(
            features.rows()[0].snippet_x, expected.snippet_x,
            "folding mismatch for id {}",
            expected.id
        );
        assert_eq!(
            predictor.predict_pair_proba(input)?.into_vec(),
            vec![expected.proba],
            "proba mismatch for id {}",
            expected.id
        );
        assert_eq!(
            predictor.predict_label(input)?.into_vec(),
            vec![expected.relation],
            "label mismatch for id {}",
            expected.id
        );
        assert_eq!(
            predictor.predict_nuclearity(input)?.into_vec(),
            vec![expected.nuclearity],
            "nuclearity mismatch for id {}",
            expected.id
        );
    }
    Ok(())
}

#[test]
fn bonus_never_changes_gold_scores() -> Result<(), Box<dyn Error>> {
    let predictor = predictor()?;
    let row = PairFeatures::new("she said.", "«Wait here,»").with_same_sentence(true);
    let list = vec![row.clone(), PairFeatures::new("«Wait here,»", "she said.")];
    assert_eq!(
        predictor.predict_pair_proba_with_bonus(FeatureInput::Row(&row), 1.0)?,
        Prediction::One(0.0)
    );
    assert_eq!(
        predictor.predict_pair_proba_with_bonus(FeatureInput::List(&list), 1.0)?,
        Prediction::Many(vec![0.0, 1.0])
    );
    Ok(())
}

#[test]
fn misses_use_configured_default_relation() -> Result<(), Box<dyn Error>> {
    let settings = PredictorSettings {
        default_relation: "same-unit_NN".into(),
        ..PredictorSettings::default()
    };
    let predictor = GoldPredictor::with_settings(GoldCorpus::default(), settings);
    let row = PairFeatures::new("a", "b");
    assert_eq!(
        predictor.predict_label(FeatureInput::Row(&row))?,
        Prediction::One("same-unit_NN".to_string())
    );
    assert!((predictor.default_penalty_for_span("short span")).abs() < f32::EPSILON);
    Ok(())
}

#[test]
fn rebuilding_a_folded_corpus_changes_nothing() -> Result<(), Box<dyn Error>> {
    let corpus = GoldCorpus::from_jsonl(CORPUS_JSONL.as_bytes())?;
    let rebuilt = GoldCorpus::new(corpus.records().to_vec());
    assert_eq!(rebuilt.records(), corpus.records());
    Ok(())
}

#[test]
fn raw_rows_match_folded_records() {
    let predictor = GoldPredictor::new(GoldCorpus::new([CorpusRecord {
        snippet_x: "“Stop”".into(),
        snippet_y: "he said — loudly.".into(),
        category_id: "attribution_SN".into(),
        order: "SN".into(),
    }]));
    let row = PairFeatures::new("“Stop”", "he said — loudly.");
    assert_eq!(
        predictor.predict_label(FeatureInput::Row(&row)).ok(),
        Some(Prediction::One("attribution_SN".to_string()))
    );
}
