//! Decompile a binary excerpt to JSON

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct DecompileArgs {
    /// Input binary (.mrp)
    pub input: PathBuf,

    /// Output JSON file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: DecompileArgs) -> Result<()> {
    let excerpt = crate::read_excerpt(&args.input)?;
    let json = serde_json::to_string_pretty(&excerpt).context("Failed to serialize to JSON")?;

    match args.output {
        Some(output) => {
            std::fs::write(&output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!(
                frames = excerpt.frame_count(),
                "Decompiled {} -> {}",
                args.input.display(),
                output.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
