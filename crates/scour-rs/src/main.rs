//! Replay a recorded transcript and report what the engine would collect.
//!
//! # Examples
//!
//! ```sh
//! # Report automatic collection and the prunable backlog
//! scour session.json
//!
//! # With protections, as the host would configure them
//! scour session.json --protect task --protect todowrite
//!
//! # Full host config document
//! scour session.json --config scour.json
//!
//! # Emit the redacted transcript itself
//! scour session.json --emit-transcript > redacted.json
//! ```

use clap::Parser;
use scour_rs::config::GcConfig;
use scour_rs::replay;
use std::path::PathBuf;
use std::process;

/// Replay a recorded transcript and report what the engine would collect.
#[derive(Parser)]
#[command(name = "scour")]
struct Cli {
    /// Path to a recorded transcript JSON file (array of messages)
    transcript: PathBuf,

    /// Engine config JSON document (host config format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tool whose output must never be pruned (repeatable)
    #[arg(long)]
    protect: Vec<String>,

    /// Tool whose input may be redacted (repeatable)
    #[arg(long)]
    allow_prune_input: Vec<String>,

    /// Print the redacted transcript JSON instead of the report
    #[arg(long)]
    emit_transcript: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = match &cli.config {
        Some(path) => match replay::load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => GcConfig::default(),
    };
    for tool in cli.protect {
        config = config.protect_tool(tool);
    }
    for tool in cli.allow_prune_input {
        config = config.allow_prune_input(tool);
    }

    let mut messages = match replay::load_transcript(&cli.transcript) {
        Ok(messages) => messages,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let report = replay::replay(&mut messages, &config);

    if cli.emit_transcript {
        match serde_json::to_string_pretty(&messages) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize transcript: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("{}", report.render());
    }
}
