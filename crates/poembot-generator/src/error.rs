//! Error types for poem generation.

use std::path::PathBuf;

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors that can occur while generating and storing poems.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The model directory does not exist.
    #[error("model {name} not found in {dir}")]
    ModelNotFound {
        /// Model name.
        name: String,
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// A file the model needs is missing.
    #[error("model artifact missing: {0}")]
    MissingArtifact(PathBuf),

    /// The hyperparameters file could not be read or parsed.
    #[error("invalid hyperparameters in {path}: {message}")]
    InvalidHParams {
        /// Path of the hyperparameters file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The requested sample length exceeds the model's context window.
    #[error("can't get samples longer than window size: {n_ctx} (requested {length})")]
    LengthExceedsContext {
        /// Requested length in tokens.
        length: u32,
        /// Model context window.
        n_ctx: u32,
    },

    /// A sampling knob is out of range.
    #[error("invalid sampling parameters: {0}")]
    InvalidParams(String),

    /// The sampler process could not be started.
    #[error("failed to start sampler {program}: {source}")]
    SamplerSpawn {
        /// Program that was launched.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The sampler stopped before producing enough samples.
    #[error("sampler exited after {produced} samples ({status})")]
    SamplerExited {
        /// Samples received before exit.
        produced: usize,
        /// Exit status description.
        status: String,
    },

    /// The sampler wrote something that is not a sample.
    #[error("sampler protocol error: {0}")]
    SamplerProtocol(String),

    /// I/O with the sampler process failed.
    #[error("sampler I/O error: {0}")]
    SamplerIo(#[from] std::io::Error),

    /// Storing the poems failed.
    #[error("storage error: {0}")]
    Store(#[from] poembot_store::StoreError),
}
