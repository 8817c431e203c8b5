//! Offline poem generation for poembot.
//!
//! This crate drives an external pretrained sampler to produce a batch of poem
//! candidates and writes them to the poems table:
//!
//! - **Model**: artifact discovery and hyperparameters (`ModelArtifacts`, `HParams`)
//! - **Params**: decoding knobs forwarded to the sampler (`SamplingParams`)
//! - **Sampler**: the `Sampler` trait and the process-backed `CommandSampler`
//! - **Driver**: `GenerationDriver`, which sequences a run end to end
//!
//! The decoding loop itself (model forward pass, top-k and nucleus filtering)
//! is the sampler's business. This crate only configures it, collects its
//! output, strips enumeration markers, and stores the result.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod params;
pub mod sampler;

pub use config::GeneratorConfig;
pub use driver::{collect_samples, GenerationDriver};
pub use error::{GeneratorError, Result};
pub use model::{HParams, ModelArtifacts};
pub use params::SamplingParams;
pub use sampler::{CommandSampler, SampleRequest, Sampler, SamplerCommand};
