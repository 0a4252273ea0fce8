use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    sync::Arc,
};

use ortho_config::{OrthoConfig, OrthoError};
use rst_predictors::{
    FeatureInput, PairPredictor, PredictError, PredictorSettings,
    api::{FeatureTable, PairFeatures},
    cli::RstpArgs,
    gold::{CorpusError, GoldCorpus, GoldPredictor},
    heuristics::normalize_sequence,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] Arc<OrthoError>),
    #[error("failed to open corpus {path}: {source}")]
    OpenCorpus {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid pair on input line {line}: {source}")]
    Pair {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("nothing to do: pass --normalize=true or --corpus <path>")]
    NothingToDo,
}

#[derive(Serialize)]
struct Answer<'a> {
    snippet_x: &'a str,
    snippet_y: &'a str,
    proba: f32,
    relation: &'a str,
    nuclearity: &'a str,
}

fn main() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = RstpArgs::load()?;
    let stdin = io::stdin().lock();
    let mut stdout = BufWriter::new(io::stdout().lock());
    if args.normalize {
        normalize(stdin, &mut stdout)?;
    } else if let Some(path) = &args.corpus {
        let predictor = load_predictor(path, args.default_relation.as_deref())?;
        answer(&predictor, stdin, &mut stdout)?;
    } else {
        return Err(RunError::NothingToDo);
    }
    stdout.flush()?;
    Ok(())
}

fn normalize(input: impl BufRead, out: &mut impl Write) -> Result<(), RunError> {
    for line in input.lines() {
        writeln!(out, "{}", normalize_sequence(&line?))?;
    }
    Ok(())
}

fn load_predictor(path: &str, default_relation: Option<&str>) -> Result<GoldPredictor, RunError> {
    let file = File::open(path).map_err(|source| RunError::OpenCorpus {
        path: path.to_string(),
        source,
    })?;
    let corpus = GoldCorpus::from_jsonl(BufReader::new(file))?;
    info!(records = corpus.len(), path, "loaded gold corpus");
    let mut settings = PredictorSettings::default();
    if let Some(relation) = default_relation {
        settings.default_relation = relation.to_string();
    }
    Ok(GoldPredictor::with_settings(corpus, settings))
}

fn answer(
    predictor: &GoldPredictor,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<(), RunError> {
    let mut rows = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: PairFeatures = serde_json::from_str(&line)
            .map_err(|source| RunError::Pair { line: i + 1, source })?;
        rows.push(row);
    }
    let table = FeatureTable::new(rows);
    let input = FeatureInput::Batch(&table);
    let probas = predictor.predict_pair_proba(input)?.into_vec();
    let relations = predictor.predict_label(input)?.into_vec();
    let nuclearities = predictor.predict_nuclearity(input)?.into_vec();
    for (((row, proba), relation), nuclearity) in
        table.iter().zip(probas).zip(&relations).zip(&nuclearities)
    {
        let answer = Answer {
            snippet_x: &row.snippet_x,
            snippet_y: &row.snippet_y,
            proba,
            relation,
            nuclearity,
        };
        serde_json::to_writer(&mut *out, &answer).map_err(io::Error::from)?;
        writeln!(out)?;
    }
    Ok(())
}
