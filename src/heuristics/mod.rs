//! Text heuristics shared by the predictors.

pub mod penalty;
pub mod text;

pub use penalty::SpanPenalty;
pub use text::{fold_symbols, normalize_sequence};
