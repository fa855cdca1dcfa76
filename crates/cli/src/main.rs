//! ScholarLoop CLI: the main entry point.
//!
//! Commands:
//! - `research` - Run an iterative literature review on a query
//! - `init`     - Write a default config file
//! - `status`   - Show the effective configuration
//! - `doctor`   - Diagnose API keys and config

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "scholarloop",
    about = "ScholarLoop: agentic scientific literature review",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Research a topic and write a cited report
    Research {
        /// What to research, e.g. "effects of metformin on liver health"
        query: String,

        /// Research iterations (3-15)
        #[arg(short = 'n', long)]
        iterations: Option<u32>,

        /// Model identifier
        #[arg(long, env = "SCHOLARLOOP_MODEL")]
        model: Option<String>,

        /// Results per search (3-10)
        #[arg(long)]
        results: Option<u32>,

        /// Directory for the report and research data files
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Write a default config file
    Init,

    /// Show the effective configuration
    Status,

    /// Diagnose API keys and config
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Research {
            query,
            iterations,
            model,
            results,
            output_dir,
        } => {
            commands::research::run(commands::research::ResearchArgs {
                query,
                iterations,
                model,
                results,
                output_dir,
            })
            .await?
        }
        Commands::Init => commands::init::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
