//! Poembot admin CLI - table provisioning and offline poem generation.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use poembot_core::PoemIndex;
use poembot_generator::{GenerationDriver, GeneratorConfig};
use poembot_store::{PoemsTable, RocksStore};

#[derive(Parser)]
#[command(name = "poembot")]
#[command(about = "Generate poems and manage the poems table")]
#[command(version)]
struct Cli {
    /// RocksDB data directory (overrides DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the poems table if it does not exist
    Provision,
    /// Delete the poems table and every poem in it
    Deprovision,
    /// Sample a batch of poems and write it to the table
    Generate(GenerateArgs),
    /// Print the poem stored under a row key or index
    Show {
        /// Row key (`poem12`) or bare index (`12`)
        key: PoemIndex,
    },
}

/// Overrides for the generation settings loaded from the environment.
#[derive(Args)]
struct GenerateArgs {
    /// Directory holding one sub-directory per model
    #[arg(long)]
    models_dir: Option<String>,
    /// Model to sample from
    #[arg(long)]
    model_name: Option<String>,
    /// Command line launching the sampler
    #[arg(long)]
    sampler_command: Option<String>,
    /// Number of poems to generate
    #[arg(long)]
    sample_count: Option<usize>,
    /// Softmax temperature
    #[arg(long)]
    temperature: Option<f32>,
    /// Candidate tokens per step, 0 for unrestricted
    #[arg(long)]
    top_k: Option<u32>,
    /// Nucleus cutoff, overrides top-k when above 0
    #[arg(long)]
    top_p: Option<f32>,
    /// Tokens per sample, defaults to the model's context window
    #[arg(long)]
    length: Option<u32>,
    /// Seed for reproducible samples
    #[arg(long)]
    seed: Option<u64>,
    /// Samples computed per sampler step
    #[arg(long)]
    batch_size: Option<u32>,
}

impl GenerateArgs {
    fn apply(self, config: &mut GeneratorConfig) {
        if let Some(value) = self.models_dir {
            config.models_dir = value;
        }
        if let Some(value) = self.model_name {
            config.model_name = value;
        }
        if let Some(value) = self.sampler_command {
            config.sampler_command = value;
        }
        if let Some(value) = self.sample_count {
            config.sample_count = value;
        }
        if let Some(value) = self.temperature {
            config.sampling.temperature = value;
        }
        if let Some(value) = self.top_k {
            config.sampling.top_k = value;
        }
        if let Some(value) = self.top_p {
            config.sampling.top_p = value;
        }
        if let Some(value) = self.length {
            config.sampling.length = Some(value);
        }
        if let Some(value) = self.seed {
            config.sampling.seed = Some(value);
        }
        if let Some(value) = self.batch_size {
            config.sampling.batch_size = value;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,poembot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = GeneratorConfig::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);
    let poems = PoemsTable::new(store);

    match cli.command {
        Command::Provision => poems.provision()?,
        Command::Deprovision => poems.deprovision()?,
        Command::Generate(args) => {
            args.apply(&mut config);

            tracing::info!(
                model = %config.model_name,
                models_dir = %config.models_dir,
                sample_count = config.sample_count,
                top_k = config.sampling.top_k,
                temperature = config.sampling.temperature,
                "Generator configuration loaded"
            );

            let written = GenerationDriver::new(config).run(&poems).await?;
            tracing::info!(written, "Poems stored");
        }
        Command::Show { key } => println!("{}", poems.read_poem(key)?),
    }

    Ok(())
}
