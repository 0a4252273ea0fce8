//! Post-mortem records for failed feature extraction.
//!
//! Each failure overwrites a plain-text file holding the offending pairs and
//! the document text. Files are meant for people, not parsers, and writes
//! are not synchronised between threads.

use crate::{api::CandidatePair, providers::ModelError};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::warn;

/// File written when a single pair fails.
pub const ERRORS_LOG: &str = "errors.log";

/// File written when whole-document extraction hits an index-range failure.
pub const FEATURE_EXTRACTOR_ERRORS_LOG: &str = "feature_extractor_errors.log";

/// Feature extraction failed for the listed pairs.
///
/// Callers skip or special-case these pairs; the failure is never retried.
#[derive(Debug, Error)]
#[error("feature extraction failed for {} pair(s): {source}", pairs.len())]
pub struct ExtractionFailure {
    /// Pairs handed to the extractor.
    pub pairs: Vec<CandidatePair>,
    #[source]
    pub source: ModelError,
    /// Diagnostic file written for this failure, if any.
    pub diagnostic: Option<PathBuf>,
}

/// Directory receiving diagnostic files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSink {
    dir: PathBuf,
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DiagnosticSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Overwrite `file_name` with the pairs and document text.
    ///
    /// Returns the written path, or `None` if the file could not be written;
    /// write failures are logged and otherwise ignored.
    pub fn record(
        &self,
        file_name: &str,
        pairs: &[CandidatePair],
        document_text: &str,
    ) -> Option<PathBuf> {
        let path = self.dir.join(file_name);
        match fs::write(&path, render(pairs, document_text)) {
            Ok(()) => Some(path),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not write extraction diagnostic");
                None
            }
        }
    }
}

fn render(pairs: &[CandidatePair], document_text: &str) -> String {
    let mut out = String::new();
    for pair in pairs {
        out.push_str(&format!(
            "{:?}\t{:?}\t{}\t{}\n",
            pair.snippet_x, pair.snippet_y, pair.loc_x, pair.loc_y
        ));
    }
    out.push('\n');
    out.push_str(document_text);
    out
}
