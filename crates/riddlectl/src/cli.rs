//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap. Every command runs the judge
//! in-process against the configured catalog and data directory.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Desert-man question judge CLI
#[derive(Parser)]
#[command(name = "riddlectl")]
#[command(about = "Ask, score and correct the desert-man question judge", long_about = None)]
#[command(version = riddle_common::VERSION)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (overrides $RIDDLE_CONFIG and /etc/riddle/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding overrides.jsonl and answer_feedback.jsonl
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output JSON only
    #[arg(long, global = true)]
    pub json: bool,

    /// Log every cascade decision
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify one yes/no question
    Ask {
        /// Question text (words are joined with spaces)
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Score a proposed solution
    Guess {
        /// Solution text (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Record the outcome a question should get from now on
    Learn {
        question: String,

        /// yes, no, ambiguous or nonsense (예/아니오 also accepted)
        outcome: String,

        /// Reply text; the outcome's default reply when omitted
        answer: Option<String>,

        /// Show the effect without writing the override file
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify every question in a file and summarize
    Replay {
        /// One question per line, optionally followed by a tab and the
        /// expected outcome; lines starting with # are skipped
        file: PathBuf,
    },

    /// Print the puzzle text
    Scenario {
        /// Include the hints
        #[arg(long)]
        hints: bool,

        /// Include the solution
        #[arg(long)]
        reveal: bool,
    },
}
