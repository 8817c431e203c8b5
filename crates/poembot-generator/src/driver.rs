//! Generation driver.
//!
//! Sequences one offline run: locate the model, start the sampler, collect and
//! clean the samples, and hand them to the poems table.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use poembot_core::strip_enumeration;
use poembot_store::PoemsTable;

use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};
use crate::model::ModelArtifacts;
use crate::sampler::{CommandSampler, SampleRequest, Sampler, SamplerCommand};

/// Runs the sampler and stores its output.
#[derive(Debug, Clone)]
pub struct GenerationDriver {
    config: GeneratorConfig,
}

impl GenerationDriver {
    /// Create a driver for `config`.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// The configuration this driver runs with.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Validate the configuration and model artifacts without starting anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is missing, its hyperparameters are
    /// invalid, the knobs are out of range, or the sampler command is empty.
    pub fn prepare(&self) -> Result<(SamplerCommand, SampleRequest)> {
        if self.config.sample_count == 0 {
            return Err(GeneratorError::InvalidParams(
                "sample_count must be at least 1".into(),
            ));
        }

        let command = SamplerCommand::parse(&self.config.sampler_command)?;
        let artifacts =
            ModelArtifacts::locate(Path::new(&self.config.models_dir), &self.config.model_name)?;
        let request = SampleRequest::new(&artifacts, self.config.sampling)?;

        Ok((command, request))
    }

    /// Generate `sample_count` cleaned poems as UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails or the sampler stops early.
    #[instrument(skip(self), fields(model = %self.config.model_name, count = self.config.sample_count))]
    pub async fn sample(&self) -> Result<Vec<Vec<u8>>> {
        let (command, request) = self.prepare()?;
        info!(length = request.length, "Sampling poems");

        let mut sampler = CommandSampler::spawn(&command, &request)?;
        let result = collect_samples(&mut sampler, self.config.sample_count).await;

        if let Err(e) = sampler.shutdown().await {
            warn!(error = %e, "Failed to stop sampler");
        }

        result
    }

    /// Generate poems and write them to `poems`. Returns the number written.
    ///
    /// # Errors
    ///
    /// Returns an error if sampling fails or the batch write fails. A failed
    /// write may leave part of the batch stored.
    pub async fn run(&self, poems: &PoemsTable) -> Result<usize> {
        let batch = self.sample().await?;
        let written = poems.write_batch(&batch)?;

        info!(written, table = %poems.table_id(), "Generation run complete");
        Ok(written)
    }
}

/// Pull `count` samples from `sampler`, stripping enumeration markers.
///
/// # Errors
///
/// Returns the sampler's error if it stops before `count` samples.
pub async fn collect_samples<S: Sampler + ?Sized>(
    sampler: &mut S,
    count: usize,
) -> Result<Vec<Vec<u8>>> {
    let mut poems = Vec::with_capacity(count);

    while poems.len() < count {
        let text = sampler.next_sample().await?;
        let cleaned = strip_enumeration(&text);

        debug!(sample = poems.len() + 1, chars = cleaned.chars().count(), "Sample generated");
        poems.push(cleaned.into_bytes());
    }

    Ok(poems)
}
