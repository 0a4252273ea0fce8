//! Configuration for ONNX-based snippet-pair classifiers.

use super::{artefact::ModelArtefact, head::OutputHead};

/// Separator placed between context strings and the left snippet.
pub const DEFAULT_CONTEXT_SEPARATOR: &str = "|";

/// Configuration for an ONNX snippet-pair classifier.
#[derive(Debug, Clone)]
pub struct OnnxPairClassifierConfig {
    /// Model artefact (ONNX graph) to load.
    pub model: ModelArtefact,
    /// Tokenizer artefact consumed by `tokenizers`.
    pub tokenizer: ModelArtefact,
    /// Input names for token ids and attention mask, in that order.
    pub input_names: Vec<String>,
    /// Output whose logits are read; only the first name is used.
    pub output_names: Vec<String>,
    /// Encoded pairs are padded and truncated to this many tokens.
    pub max_sequence_length: usize,
    pub pad_token: String,
    pub pad_id: u32,
    /// How logits are interpreted.
    pub head: OutputHead,
    /// Joins context strings onto the left segment.
    pub context_separator: String,
}
