//! Sampler backed by an external process.
//!
//! The process is started once with the model location and decoding knobs as
//! flags, then writes one JSON object per generated text to stdout:
//!
//! ```text
//! {"text": "first sample"}
//! {"text": "second sample"}
//! ```
//!
//! Blank lines are ignored. Stderr is passed through to ours.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, instrument};

use super::{SampleRequest, Sampler};
use crate::error::{GeneratorError, Result};

/// Program and leading arguments used to launch the sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments placed before the generated flags.
    pub args: Vec<String>,
}

impl SamplerCommand {
    /// Split a whitespace-separated command line, e.g. `python3 sample.py`.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InvalidParams` if the command line is empty.
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| GeneratorError::InvalidParams("sampler command is empty".into()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// Build the flags describing `request`.
#[must_use]
pub fn request_args(request: &SampleRequest) -> Vec<String> {
    let params = &request.params;
    let mut args = vec![
        "--model-name".to_string(),
        request.model_name.clone(),
        "--model-dir".to_string(),
        request.model_dir.display().to_string(),
        "--checkpoint".to_string(),
        request.checkpoint.display().to_string(),
        "--length".to_string(),
        request.length.to_string(),
        "--temperature".to_string(),
        params.temperature.to_string(),
        "--top-k".to_string(),
        params.top_k.to_string(),
        "--top-p".to_string(),
        params.top_p.to_string(),
        "--batch-size".to_string(),
        params.batch_size.to_string(),
    ];

    if let Some(seed) = params.seed {
        args.push("--seed".to_string());
        args.push(seed.to_string());
    }

    args
}

#[derive(Debug, Deserialize)]
struct SampleLine {
    text: String,
}

/// A sampler running as a child process.
pub struct CommandSampler {
    program: String,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    produced: usize,
}

impl CommandSampler {
    /// Start the sampler process for `request`.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::SamplerSpawn` if the process can't be started.
    #[instrument(skip_all, fields(program = %command.program, model = %request.model_name))]
    pub fn spawn(command: &SamplerCommand, request: &SampleRequest) -> Result<Self> {
        let args = request_args(request);
        debug!(args = ?args, "Launching sampler");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GeneratorError::SamplerSpawn {
                program: command.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            GeneratorError::SamplerProtocol("sampler stdout was not captured".into())
        })?;

        info!("Sampler started");

        Ok(Self {
            program: command.program.clone(),
            child,
            lines: BufReader::new(stdout).lines(),
            produced: 0,
        })
    }

    /// Samples received so far.
    #[must_use]
    pub fn produced(&self) -> usize {
        self.produced
    }
}

#[async_trait]
impl Sampler for CommandSampler {
    async fn next_sample(&mut self) -> Result<String> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                let status = self.child.wait().await?;
                return Err(GeneratorError::SamplerExited {
                    produced: self.produced,
                    status: status.to_string(),
                });
            };

            if line.trim().is_empty() {
                continue;
            }

            let sample: SampleLine = serde_json::from_str(&line).map_err(|e| {
                GeneratorError::SamplerProtocol(format!(
                    "line {} from {}: {e}",
                    self.produced + 1,
                    self.program
                ))
            })?;

            self.produced += 1;
            return Ok(sample.text);
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(status) = self.child.try_wait()? {
            debug!(%status, "Sampler already exited");
            return Ok(());
        }

        self.child.kill().await?;
        debug!(produced = self.produced, "Sampler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HParams;
    use crate::params::SamplingParams;
    use std::path::PathBuf;

    fn request(seed: Option<u64>) -> SampleRequest {
        SampleRequest {
            model_name: "345M-poetry".into(),
            model_dir: PathBuf::from("models/345M-poetry"),
            checkpoint: PathBuf::from("models/345M-poetry/model-1000"),
            hparams: HParams::default(),
            params: SamplingParams {
                temperature: 0.9,
                top_k: 40,
                seed,
                ..SamplingParams::default()
            },
            length: 1024,
        }
    }

    #[test]
    fn parse_command_line() {
        let command = SamplerCommand::parse("python3  scripts/sample.py --quiet").unwrap();
        assert_eq!(command.program, "python3");
        assert_eq!(command.args, vec!["scripts/sample.py", "--quiet"]);

        assert!(matches!(
            SamplerCommand::parse("   "),
            Err(GeneratorError::InvalidParams(_))
        ));
    }

    #[test]
    fn args_carry_knobs() {
        let args = request_args(&request(None));
        let joined = args.join(" ");

        assert!(joined.contains("--model-name 345M-poetry"));
        assert!(joined.contains("--length 1024"));
        assert!(joined.contains("--temperature 0.9"));
        assert!(joined.contains("--top-k 40"));
        assert!(joined.contains("--top-p 0"));
        assert!(joined.contains("--batch-size 1"));
        assert!(!joined.contains("--seed"));
    }

    #[test]
    fn seed_is_forwarded_when_set() {
        let args = request_args(&request(Some(1234)));
        let position = args.iter().position(|arg| arg == "--seed").unwrap();
        assert_eq!(args[position + 1], "1234");
    }
}
