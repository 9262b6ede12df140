//! Scribe CLI - Inspect, convert and replay editor session excerpts
//!
//! # Commands
//!
//! - `scribe info` - Summarize an .mrp excerpt
//! - `scribe validate` - Check structure and replay determinism
//! - `scribe decompile` - Dump an .mrp excerpt as JSON
//! - `scribe compile` - Encode a JSON excerpt as .mrp
//! - `scribe render` - Play an excerpt headlessly and print the document
//!
//! # Usage
//!
//! ```bash
//! # What is in this recording?
//! scribe info session.mrp
//!
//! # Document text 12.5 seconds in
//! scribe render session.mrp --at 12.5
//!
//! # Hand-edit a recording
//! scribe decompile session.mrp -o session.json
//! scribe compile session.json -o session.mrp
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

mod info;
mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

use scribe_core::replay::{Excerpt, binary};

/// Scribe CLI - Editor session excerpt tool
#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Inspect, convert and replay editor session excerpts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an excerpt
    Info(info::InfoArgs),

    #[command(flatten)]
    Replay(replay::ReplayAction),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info(args) => info::execute(args),
        Commands::Replay(action) => replay::execute(action),
    }
}

/// Read and decode an .mrp file
pub(crate) fn read_excerpt(path: &Path) -> Result<Excerpt> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    binary::decode(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}
