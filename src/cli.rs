//! CLI argument types and layered configuration for the `rstp` binary.
//! Loads from CLI args, environment (prefix `RSTP_`), and optional config
//! files.

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use ortho_config::OrthoError;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the `rstp` binary.
///
/// With `normalize` set, stdin lines are normalised for model input. With a
/// `corpus`, stdin carries JSON lines of snippet pairs that are answered
/// from the gold corpus.
///
/// # Examples
///
/// Parse flags directly:
/// ```
/// use rst_predictors::cli::RstpArgs;
/// use ortho_config::OrthoConfig;
///
/// let args = RstpArgs::load_from_iter(["rstp", "--normalize=true"])
///     .expect("load args from CLI iterator");
/// assert!(args.normalize);
/// ```
///
/// Load from a configuration file:
/// ```
/// use rst_predictors::cli::RstpArgs;
/// use ortho_config::OrthoConfig;
/// use std::io::Write;
/// use tempfile::NamedTempFile;
///
/// let mut file = NamedTempFile::new().expect("create temp file");
/// writeln!(file, "corpus = \"gold.jsonl\"").expect("write config");
/// let path = file.path().to_str().expect("path str");
/// let args = RstpArgs::load_from_iter(["rstp", "--config-path", path])
///     .expect("load args from config path");
/// assert_eq!(args.corpus.as_deref(), Some("gold.jsonl"));
/// ```
#[derive(Debug, Deserialize, ortho_config::OrthoConfig)]
#[ortho_config(prefix = "RSTP")]
pub struct RstpArgs {
    /// Normalise stdin lines instead of answering pairs.
    #[ortho_config(default = false)]
    #[serde(default)]
    pub normalize: bool,

    /// JSON-lines gold corpus to answer pairs from.
    pub corpus: Option<String>,

    /// Label for pairs missing from the corpus.
    pub default_relation: Option<String>,

    /// Optional path to a configuration file.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl RstpArgs {
    /// Load configuration solely from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if any variable cannot be parsed.
    pub fn load_from_env() -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Env::prefixed("RSTP_"))
            .extract()
            .map_err(Into::into)
    }

    /// Load configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if the file cannot be read or parsed.
    pub fn load_from_config(path: &str) -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(Into::into)
    }

    /// Load configuration from environment variables and a file path.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if either source contains invalid values.
    pub fn load_from_env_and_config(path: &str) -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RSTP_"))
            .extract()
            .map_err(Into::into)
    }
}
