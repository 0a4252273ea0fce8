use std::sync::{Arc, Mutex};

use ort::{session::Session, value::TensorRef};
use tokenizers::{
    EncodeInput, PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};

use super::{config::OnnxPairClassifierConfig, errors::OnnxPairClassifierError, head::OutputHead};
use crate::providers::PairBatch;

/// Cross-encoder over `(context + left snippet, right snippet)` pairs.
#[derive(Debug)]
pub(crate) struct OnnxPairClassifier {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    input_ids: String,
    attention_mask: String,
    output: String,
    max_sequence_length: usize,
    head: OutputHead,
    separator: String,
}

impl OnnxPairClassifier {
    /// Verify the artefacts and open the ONNX session.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is incomplete, an artefact
    /// fails verification, or the tokenizer or session cannot be created.
    pub(crate) fn new(config: OnnxPairClassifierConfig) -> Result<Self, OnnxPairClassifierError> {
        let OnnxPairClassifierConfig {
            model,
            tokenizer: tokenizer_artefact,
            input_names,
            output_names,
            max_sequence_length,
            pad_token,
            pad_id,
            head,
            context_separator,
        } = config;

        if max_sequence_length == 0 {
            return Err(OnnxPairClassifierError::ZeroSequenceLength);
        }
        let [input_ids, attention_mask, ..] = input_names.as_slice() else {
            return Err(OnnxPairClassifierError::InsufficientInputNames {
                expected: 2,
                actual: input_names.len(),
            });
        };
        let output = output_names
            .first()
            .cloned()
            .ok_or(OnnxPairClassifierError::MissingOutputNames)?;
        head.validate()?;

        model.verify()?;
        tokenizer_artefact.verify()?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_artefact.path).map_err(|source| {
            OnnxPairClassifierError::LoadTokenizer {
                path: tokenizer_artefact.path.clone(),
                source,
            }
        })?;
        // Context and the left snippet live in the first segment; cut there first.
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
                direction: TruncationDirection::Left,
            }))
            .map_err(OnnxPairClassifierError::ConfigureTruncation)?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_sequence_length),
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id,
            pad_type_id: 0,
            pad_token,
        }));

        let session = Session::builder()
            .map_err(OnnxPairClassifierError::CreateSessionBuilder)?
            .commit_from_file(&model.path)
            .map_err(OnnxPairClassifierError::CreateSession)?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            input_ids: input_ids.clone(),
            attention_mask: attention_mask.clone(),
            output,
            max_sequence_length,
            head,
            separator: context_separator,
        })
    }

    pub(crate) fn head(&self) -> &OutputHead {
        &self.head
    }

    /// Logits for every pair of the batch, in order.
    ///
    /// # Errors
    ///
    /// Returns the first encoding or inference failure.
    pub(crate) fn logits_batch(
        &self,
        batch: &PairBatch<'_>,
    ) -> Result<Vec<Vec<f32>>, OnnxPairClassifierError> {
        batch
            .snippet_x
            .iter()
            .zip(&batch.snippet_y)
            .enumerate()
            .map(|(i, (x, y))| {
                let mut first = batch.context_of(i);
                first.push(*x);
                self.logits(&first.join(&self.separator), y)
            })
            .collect()
    }

    fn logits(&self, first: &str, second: &str) -> Result<Vec<f32>, OnnxPairClassifierError> {
        let input = EncodeInput::Dual(first.into(), second.into());
        let encoding = self
            .tokenizer
            .encode(input, true)
            .map_err(OnnxPairClassifierError::Encode)?;

        let ids = to_i64(encoding.get_ids(), self.max_sequence_length)?;
        let attention = to_i64(encoding.get_attention_mask(), self.max_sequence_length)?;
        let shape = [1usize, self.max_sequence_length];
        let ids_tensor = TensorRef::from_array_view((shape, ids.as_slice()))
            .map_err(OnnxPairClassifierError::EncodeTensor)?;
        let attention_tensor = TensorRef::from_array_view((shape, attention.as_slice()))
            .map_err(OnnxPairClassifierError::EncodeTensor)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| OnnxPairClassifierError::SessionPoisoned)?;
        let outputs = session
            .run(ort::inputs! {
                self.input_ids.as_str() => ids_tensor,
                self.attention_mask.as_str() => attention_tensor,
            })
            .map_err(OnnxPairClassifierError::Inference)?;
        let value = outputs
            .get(self.output.as_str())
            .ok_or_else(|| OnnxPairClassifierError::OutputMissing {
                name: self.output.clone(),
            })?;
        let (_, logits) = value
            .try_extract_tensor::<f32>()
            .map_err(OnnxPairClassifierError::Inference)?;

        let expected = self.head.width();
        if logits.len() != expected {
            return Err(OnnxPairClassifierError::UnexpectedLogitCount {
                name: self.output.clone(),
                expected,
                actual: logits.len(),
            });
        }
        Ok(logits.to_vec())
    }
}

fn to_i64(values: &[u32], expected: usize) -> Result<Vec<i64>, OnnxPairClassifierError> {
    if values.len() != expected {
        return Err(OnnxPairClassifierError::SequenceLength {
            expected,
            actual: values.len(),
        });
    }
    Ok(values.iter().map(|v| i64::from(*v)).collect())
}
