//! Generator configuration.

use std::str::FromStr;

use crate::params::SamplingParams;

/// Model used by the scheduled generation run.
pub const DEFAULT_MODEL_NAME: &str = "345M-poetry";

/// Poems generated per run.
pub const DEFAULT_SAMPLE_COUNT: usize = 500;

/// Generator configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Path to `RocksDB` data directory (default: "/data/poembot").
    pub data_dir: String,

    /// Directory holding one sub-directory per model (default: "models").
    pub models_dir: String,

    /// Model to sample from (default: "345M-poetry").
    pub model_name: String,

    /// Command line launching the sampler (default: "poembot-sampler").
    pub sampler_command: String,

    /// Number of poems to generate (default: 500).
    pub sample_count: usize,

    /// Decoding knobs (default: `top_k` 40, temperature 0.9).
    pub sampling: SamplingParams,
}

impl GeneratorConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            models_dir: std::env::var("MODELS_DIR").unwrap_or(defaults.models_dir),
            model_name: std::env::var("MODEL_NAME").unwrap_or(defaults.model_name),
            sampler_command: std::env::var("SAMPLER_COMMAND").unwrap_or(defaults.sampler_command),
            sample_count: env_parse("SAMPLE_COUNT").unwrap_or(defaults.sample_count),
            sampling: SamplingParams {
                temperature: env_parse("TEMPERATURE").unwrap_or(defaults.sampling.temperature),
                top_k: env_parse("TOP_K").unwrap_or(defaults.sampling.top_k),
                top_p: env_parse("TOP_P").unwrap_or(defaults.sampling.top_p),
                length: env_parse("LENGTH"),
                seed: env_parse("SEED"),
                batch_size: env_parse("BATCH_SIZE").unwrap_or(defaults.sampling.batch_size),
            },
        }
    }
}

/// Parse an environment variable, ignoring it if unset or malformed.
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(variable = %name, value = %value, "Ignoring malformed setting");
            None
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            data_dir: "/data/poembot".into(),
            models_dir: "models".into(),
            model_name: DEFAULT_MODEL_NAME.into(),
            sampler_command: "poembot-sampler".into(),
            sample_count: DEFAULT_SAMPLE_COUNT,
            sampling: SamplingParams {
                temperature: 0.9,
                top_k: 40,
                ..SamplingParams::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scheduled_run() {
        let config = GeneratorConfig::default();
        assert_eq!(config.model_name, "345M-poetry");
        assert_eq!(config.sample_count, 500);
        assert_eq!(config.sampling.top_k, 40);
        assert!((config.sampling.temperature - 0.9).abs() < f32::EPSILON);
        assert!(config.sampling.top_p.abs() < f32::EPSILON);
        assert_eq!(config.sampling.length, None);
        assert_eq!(config.sampling.seed, None);
    }
}
