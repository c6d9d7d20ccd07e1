//! embedprobe CLI - compare text embeddings of paper metadata.
//!
//! Every text field of the paper dataset is embedded with TF-IDF, a sentence
//! transformer and CLIP's text tower, and each embedding is scored by how well
//! a cross-validated classifier recovers the research area and by how well
//! the research areas cluster.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the ONNX encoders once
//! embedprobe models download
//!
//! # Run the whole experiment
//! embedprobe run
//!
//! # Only titles, only TF-IDF, results to a file
//! embedprobe run --field title --embedder tfidf --output results.jsonl --format jsonl
//!
//! # View configuration
//! embedprobe config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// embedprobe - compare text embeddings of paper metadata.
#[derive(Parser, Debug)]
#[command(name = "embedprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the field × embedding experiment and print the reports
    Run(cli::run::RunArgs),

    /// Manage the ONNX encoders (download, list, path)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match embedprobe_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `embedprobe config path`."
            );
            embedprobe_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("embedprobe v{}", embedprobe_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args),
    }
}
