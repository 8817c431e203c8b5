//! Sampling knobs forwarded to the sampler.

use crate::error::{GeneratorError, Result};
use crate::model::HParams;

/// Decoding parameters for one generation run.
///
/// The values are passed through to the sampler unchanged; this crate only
/// checks that they are in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Softmax temperature. Lower is more deterministic.
    pub temperature: f32,
    /// Candidate tokens kept per step. 0 means unrestricted.
    pub top_k: u32,
    /// Nucleus cutoff. Overrides `top_k` when greater than 0.
    pub top_p: f32,
    /// Tokens per sample. Defaults to the model's context window.
    pub length: Option<u32>,
    /// Seed for the sampler's random source and model randomness.
    pub seed: Option<u64>,
    /// Samples computed per sampler step. Affects speed and memory only.
    pub batch_size: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_k: 0,
            top_p: 0.0,
            length: None,
            seed: None,
            batch_size: 1,
        }
    }
}

impl SamplingParams {
    /// Check the knobs and resolve the sample length against `hparams`.
    ///
    /// # Errors
    ///
    /// - `GeneratorError::LengthExceedsContext` if `length` is over `n_ctx`.
    /// - `GeneratorError::InvalidParams` for out-of-range knobs.
    pub fn resolve_length(&self, hparams: &HParams) -> Result<u32> {
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(GeneratorError::InvalidParams(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(GeneratorError::InvalidParams(format!(
                "top_p must be within [0, 1], got {}",
                self.top_p
            )));
        }

        if self.batch_size == 0 {
            return Err(GeneratorError::InvalidParams(
                "batch_size must be at least 1".into(),
            ));
        }

        match self.length {
            None => Ok(hparams.n_ctx),
            Some(0) => Err(GeneratorError::InvalidParams(
                "length must be at least 1".into(),
            )),
            Some(length) if length > hparams.n_ctx => Err(GeneratorError::LengthExceedsContext {
                length,
                n_ctx: hparams.n_ctx,
            }),
            Some(length) => Ok(length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_defaults_to_context_window() {
        let params = SamplingParams::default();
        assert_eq!(params.resolve_length(&HParams::default()).unwrap(), 1024);
    }

    #[test]
    fn explicit_length_is_kept() {
        let params = SamplingParams {
            length: Some(200),
            ..SamplingParams::default()
        };
        assert_eq!(params.resolve_length(&HParams::default()).unwrap(), 200);
    }

    #[test]
    fn length_over_window_is_fatal() {
        let params = SamplingParams {
            length: Some(2048),
            ..SamplingParams::default()
        };
        assert!(matches!(
            params.resolve_length(&HParams::default()),
            Err(GeneratorError::LengthExceedsContext {
                length: 2048,
                n_ctx: 1024
            })
        ));
    }

    #[test]
    fn out_of_range_knobs_are_rejected() {
        let hparams = HParams::default();
        let bad = [
            SamplingParams {
                temperature: 0.0,
                ..SamplingParams::default()
            },
            SamplingParams {
                top_p: 1.5,
                ..SamplingParams::default()
            },
            SamplingParams {
                batch_size: 0,
                ..SamplingParams::default()
            },
            SamplingParams {
                length: Some(0),
                ..SamplingParams::default()
            },
        ];

        for params in bad {
            assert!(
                matches!(params.resolve_length(&hparams), Err(GeneratorError::InvalidParams(_))),
                "{params:?} should be rejected"
            );
        }
    }
}
