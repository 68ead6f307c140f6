//! riddlectl - command-line client for the desert-man question judge
//!
//! Runs the judge in-process: no daemon needed.

use anyhow::Result;
use clap::Parser;
use riddlectl::cli::{Cli, Commands};
use riddlectl::commands::{self, Context};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet unless asked; RUST_LOG still wins
    let default_level = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::load(cli.config.as_deref(), cli.data_dir, cli.json)?;

    match cli.command {
        Commands::Ask { question } => commands::ask(&ctx, &question),
        Commands::Guess { text } => commands::guess(&ctx, &text),
        Commands::Learn {
            question,
            outcome,
            answer,
            dry_run,
        } => commands::learn(&ctx, &question, &outcome, answer.as_deref(), dry_run),
        Commands::Replay { file } => commands::replay(&ctx, &file),
        Commands::Scenario { hints, reveal } => commands::scenario(&ctx, hints, reveal),
    }
}
