//! Pretrained model artifacts on local disk.
//!
//! A model named `345M-poetry` lives in `<models_dir>/345M-poetry/` and holds:
//!
//! - `hparams.json`: hyperparameters, overriding the defaults below
//! - `encoder.json` and `vocab.bpe`: the tokenizer vocabulary
//! - `checkpoint`: index naming the latest weights checkpoint
//! - `<checkpoint>.index` and its data shards: the weights

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{GeneratorError, Result};

/// Hyperparameters file name.
pub const HPARAMS_FILE: &str = "hparams.json";

/// Checkpoint index file name.
pub const CHECKPOINT_FILE: &str = "checkpoint";

/// Tokenizer files every model directory must contain.
pub const TOKENIZER_FILES: [&str; 2] = ["encoder.json", "vocab.bpe"];

/// Model hyperparameters.
///
/// Fields missing from `hparams.json` keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HParams {
    /// Vocabulary size.
    pub n_vocab: u32,
    /// Context window in tokens.
    pub n_ctx: u32,
    /// Embedding width.
    pub n_embd: u32,
    /// Attention heads.
    pub n_head: u32,
    /// Transformer layers.
    pub n_layer: u32,
}

impl Default for HParams {
    fn default() -> Self {
        Self {
            n_vocab: 0,
            n_ctx: 1024,
            n_embd: 768,
            n_head: 12,
            n_layer: 12,
        }
    }
}

impl HParams {
    /// Load hyperparameters from a JSON file over the defaults.
    ///
    /// # Errors
    ///
    /// - `GeneratorError::MissingArtifact` if the file doesn't exist.
    /// - `GeneratorError::InvalidHParams` if it can't be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GeneratorError::MissingArtifact(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| GeneratorError::InvalidHParams {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&contents).map_err(|e| GeneratorError::InvalidHParams {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Located and validated files for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    /// Model name.
    pub name: String,
    /// Model directory.
    pub dir: PathBuf,
    /// Hyperparameters file.
    pub hparams_path: PathBuf,
    /// Checkpoint prefix of the latest weights.
    pub checkpoint: PathBuf,
}

impl ModelArtifacts {
    /// Find the artifacts for `name` under `models_dir`.
    ///
    /// # Errors
    ///
    /// - `GeneratorError::ModelNotFound` if the model directory is missing.
    /// - `GeneratorError::MissingArtifact` if any required file is missing or
    ///   the checkpoint index names no checkpoint.
    pub fn locate(models_dir: &Path, name: &str) -> Result<Self> {
        let dir = models_dir.join(name);
        if !dir.is_dir() {
            return Err(GeneratorError::ModelNotFound {
                name: name.to_string(),
                dir: models_dir.to_path_buf(),
            });
        }

        let hparams_path = dir.join(HPARAMS_FILE);
        if !hparams_path.is_file() {
            return Err(GeneratorError::MissingArtifact(hparams_path));
        }

        for file in TOKENIZER_FILES {
            let path = dir.join(file);
            if !path.is_file() {
                return Err(GeneratorError::MissingArtifact(path));
            }
        }

        let checkpoint = latest_checkpoint(&dir)?;
        debug!(model = %name, checkpoint = %checkpoint.display(), "Model artifacts located");

        Ok(Self {
            name: name.to_string(),
            dir,
            hparams_path,
            checkpoint,
        })
    }

    /// Load this model's hyperparameters.
    ///
    /// # Errors
    ///
    /// See [`HParams::load`].
    pub fn hparams(&self) -> Result<HParams> {
        HParams::load(&self.hparams_path)
    }
}

/// Resolve the latest checkpoint named by `<dir>/checkpoint`.
///
/// The index holds lines like `model_checkpoint_path: "model-1000"`; relative
/// paths are resolved against `dir`. The checkpoint's `.index` file must exist.
fn latest_checkpoint(dir: &Path) -> Result<PathBuf> {
    let index_path = dir.join(CHECKPOINT_FILE);
    let contents = std::fs::read_to_string(&index_path)
        .map_err(|_| GeneratorError::MissingArtifact(index_path.clone()))?;

    let name = parse_checkpoint_index(&contents)
        .ok_or_else(|| GeneratorError::MissingArtifact(index_path.clone()))?;

    let checkpoint = dir.join(name);
    let weights_index = PathBuf::from(format!("{}.index", checkpoint.display()));
    if !weights_index.is_file() {
        return Err(GeneratorError::MissingArtifact(weights_index));
    }

    Ok(checkpoint)
}

/// Extract `model_checkpoint_path` from a checkpoint index.
fn parse_checkpoint_index(contents: &str) -> Option<&str> {
    contents.lines().find_map(|line| {
        let value = line.trim().strip_prefix("model_checkpoint_path:")?;
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then_some(value)
    })
}
