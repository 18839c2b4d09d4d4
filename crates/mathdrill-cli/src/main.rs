//! mathdrill CLI — practice math word problems graded by a language model.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mathdrill_core::Difficulty;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(
    name = "mathdrill",
    version,
    about = "Math word problem trainer backed by a generative-language API"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive practice session
    Practice {
        /// Starting difficulty: easy, medium or hard
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Provider name from the config (default: default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Model identifier (default: default_model)
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory to write a JSON transcript to when the session ends
        #[arg(long)]
        transcript_dir: Option<PathBuf>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never interleave with the practice UI.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Practice {
            difficulty,
            provider,
            model,
            config,
            transcript_dir,
        } => {
            commands::practice::execute(difficulty, provider, model, config, transcript_dir).await
        }
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
