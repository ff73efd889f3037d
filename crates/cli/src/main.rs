//! stepline CLI — the main entry point.
//!
//! Commands:
//! - `run`   — Execute a task through the loop and deliver the result
//! - `tools` — List the registered tools and their parameter slots

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "stepline",
    about = "stepline — a bounded iterative tool-use loop runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file (default: ~/.stepline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a task through the loop
    Run {
        /// The natural-language task
        #[arg(required = true)]
        task: Vec<String>,

        /// Override the step budget
        #[arg(long)]
        max_steps: Option<u32>,

        /// Override the oracle model
        #[arg(long)]
        model: Option<String>,

        /// Accept a non-conforming oracle turn as the final answer
        /// instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// List the registered tools
    Tools,
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
        .init();

    match cli.command {
        Commands::Run {
            task,
            max_steps,
            model,
            lenient,
        } => {
            let succeeded =
                commands::run::run(cli.config, task.join(" "), max_steps, model, lenient).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::Tools => commands::tools_cmd::run(cli.config)?,
    }

    Ok(())
}
