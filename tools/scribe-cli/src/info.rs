//! Summarize an excerpt

use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

use scribe_core::replay::{Excerpt, binary};

#[derive(Args)]
pub struct InfoArgs {
    /// Excerpt file (.mrp)
    pub input: PathBuf,
}

pub fn execute(args: InfoArgs) -> Result<()> {
    let excerpt = crate::read_excerpt(&args.input)?;
    let summary = Summary::of(&excerpt);

    println!("=== {} ===", args.input.display());
    println!("Recorded at: {} ms (Unix)", excerpt.timestamp);
    println!("Duration: {:.3}s", excerpt.duration_ms() as f64 / 1000.0);
    println!("Frames: {}", excerpt.frame_count());
    println!("  with edits: {}", summary.edit_frames);
    println!("  view only: {}", summary.view_frames);
    println!("Operations: {}", excerpt.operation_count());
    println!("Initial text: {} bytes", excerpt.value.len());
    println!("Encoded size: {} bytes", binary::encode(&excerpt).len());

    if summary.events.is_empty() {
        println!("Events: none");
    } else {
        println!("Events:");
        for (name, count) in &summary.events {
            println!("  {name}: {count}");
        }
    }

    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct Summary {
    edit_frames: usize,
    view_frames: usize,
    events: BTreeMap<String, usize>,
}

impl Summary {
    fn of(excerpt: &Excerpt) -> Self {
        let mut summary = Summary::default();
        for frame in &excerpt.frames {
            if !frame.operations.is_empty() {
                summary.edit_frames += 1;
            } else if frame.events.is_empty() {
                summary.view_frames += 1;
            }
        }
        for event in excerpt.events() {
            *summary.events.entry(event.name.clone()).or_default() += 1;
        }
        summary
    }
}
