//! Sampler abstraction.
//!
//! The language model and its decoding loop live outside this crate. A
//! `Sampler` is a handle on a running instance that yields generated texts one
//! at a time. The sequence is finite and cannot be restarted.

pub mod command;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{HParams, ModelArtifacts};
use crate::params::SamplingParams;

pub use command::{CommandSampler, SamplerCommand};

/// Everything a sampler needs to start generating.
#[derive(Debug, Clone)]
pub struct SampleRequest {
    /// Model name.
    pub model_name: String,
    /// Model directory holding the tokenizer and hyperparameters.
    pub model_dir: PathBuf,
    /// Checkpoint prefix to restore weights from.
    pub checkpoint: PathBuf,
    /// Loaded hyperparameters.
    pub hparams: HParams,
    /// Decoding knobs.
    pub params: SamplingParams,
    /// Resolved sample length in tokens.
    pub length: u32,
}

impl SampleRequest {
    /// Build a request from located artifacts, validating the knobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the hyperparameters can't be loaded or the knobs
    /// are out of range for the model.
    pub fn new(artifacts: &ModelArtifacts, params: SamplingParams) -> Result<Self> {
        let hparams = artifacts.hparams()?;
        let length = params.resolve_length(&hparams)?;

        Ok(Self {
            model_name: artifacts.name.clone(),
            model_dir: artifacts.dir.clone(),
            checkpoint: artifacts.checkpoint.clone(),
            hparams,
            params,
            length,
        })
    }
}

/// A running text sampler.
#[async_trait]
pub trait Sampler: Send {
    /// Wait for the next generated text.
    ///
    /// # Errors
    ///
    /// Returns an error if the sampler has stopped or produced malformed output.
    async fn next_sample(&mut self) -> Result<String>;

    /// Stop the sampler and release its resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the sampler could not be stopped cleanly.
    async fn shutdown(&mut self) -> Result<()>;
}
