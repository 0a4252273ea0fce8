use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::OnnxPairClassifierError;

/// Model or tokenizer file pinned to a SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtefact {
    pub path: PathBuf,
    /// Expected digest, hexadecimal in either case.
    pub sha256: String,
}

impl ModelArtefact {
    /// Fail unless the file on disk hashes to the pinned digest.
    ///
    /// # Errors
    ///
    /// Returns `ChecksumMismatch` when the digests differ and `Io` when the
    /// file cannot be read.
    pub fn verify(&self) -> Result<(), OnnxPairClassifierError> {
        let expected = self.sha256.trim().to_ascii_lowercase();
        let actual = sha256_hex(&self.path)?;
        if actual == expected {
            return Ok(());
        }
        Err(OnnxPairClassifierError::ChecksumMismatch {
            path: self.path.clone(),
            expected,
            actual,
        })
    }
}

/// Lowercase hexadecimal SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns `Io` when the file cannot be opened or read.
pub fn sha256_hex(path: &Path) -> Result<String, OnnxPairClassifierError> {
    let io_error = |source: io::Error| OnnxPairClassifierError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(io_error)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher).map_err(io_error)?;
    Ok(format!("{:x}", hasher.finalize()))
}
