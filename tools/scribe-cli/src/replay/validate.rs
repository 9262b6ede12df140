//! Validate an excerpt without playing it

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use scribe_core::replay::{CacheConfig, Excerpt, PlaybackCache, replay_text};

#[derive(Args)]
pub struct ValidateArgs {
    /// Excerpt file (.mrp)
    pub input: PathBuf,

    /// Frames between cache snapshots used for the determinism check
    #[arg(long, default_value = "100")]
    pub snapshot_interval: usize,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("Validating excerpt: {}", args.input.display());

    let excerpt = crate::read_excerpt(&args.input)?;

    println!();
    println!("=== Excerpt Decoded ===");
    println!("Frames: {}", excerpt.frame_count());
    println!("Operations: {}", excerpt.operation_count());

    let mut errors: Vec<String> = excerpt
        .validate()
        .into_iter()
        .map(|issue| issue.to_string())
        .collect();

    if let Err(e) = check_determinism(Arc::new(excerpt), args.snapshot_interval) {
        errors.push(e);
    }

    if errors.is_empty() {
        println!();
        println!("Structure and replay are consistent.");
    } else {
        println!();
        println!("=== Validation Errors ===");
        for error in &errors {
            println!("  {}", error);
        }
        anyhow::bail!("{} validation error(s)", errors.len());
    }

    Ok(())
}

/// Compare the cache's final text with a straight replay of every operation
fn check_determinism(excerpt: Arc<Excerpt>, snapshot_interval: usize) -> Result<(), String> {
    let linear = replay_text(
        &excerpt.value,
        excerpt.frames.iter().flat_map(|frame| frame.operations.iter()),
    );

    let mut cache = PlaybackCache::new(
        excerpt,
        CacheConfig {
            snapshot_interval,
            ..Default::default()
        },
    );
    cache.build_all();

    match cache.final_value() {
        Some(cached) if cached == linear => Ok(()),
        Some(_) => Err("Cached final text differs from linear replay".to_string()),
        None => Err("Playback cache could not be built".to_string()),
    }
}
