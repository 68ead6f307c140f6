//! riddled - question judge daemon for the desert-man puzzle
//!
//! Serves the ask/guess/hint game over HTTP and records player corrections.

use anyhow::Result;
use clap::Parser;
use riddle_common::RiddleConfig;
use riddled::server::{self, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riddled", version, about = "Desert-man question judge daemon")]
struct Cli {
    /// Config file (default: $RIDDLE_CONFIG, then /etc/riddle/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override server.bind
    #[arg(long)]
    bind: Option<String>,

    /// Override storage.data_dir
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RiddleConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("riddled v{} starting", riddle_common::VERSION);
    info!("  Data directory: {}", config.data_dir().display());

    let state = AppState::from_config(&config)?;
    info!(
        "  Scenario '{}' with {} hints, {} questions per session",
        state.scenario.title,
        state.scenario.hints.len(),
        config.server.questions_per_session
    );

    server::run(state, &config).await
}
