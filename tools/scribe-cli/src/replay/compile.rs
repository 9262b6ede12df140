//! Compile a JSON excerpt to binary format

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use scribe_core::replay::{Excerpt, binary};

#[derive(Args)]
pub struct CompileArgs {
    /// Input excerpt (.json)
    pub input: PathBuf,

    /// Output binary (.mrp)
    #[arg(short, long)]
    pub output: PathBuf,
}

pub fn execute(args: CompileArgs) -> Result<()> {
    println!("Compiling: {} -> {}", args.input.display(), args.output.display());

    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let excerpt: Excerpt = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse excerpt JSON: {}", args.input.display()))?;

    for issue in excerpt.validate() {
        tracing::warn!("{issue}");
    }

    binary::write_excerpt_file(&args.output, &excerpt)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!();
    println!("=== Compilation Complete ===");
    println!("Frames: {}", excerpt.frame_count());
    println!("Operations: {}", excerpt.operation_count());
    println!("Duration: {:.3}s", excerpt.duration_ms() as f64 / 1000.0);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::decompile::{self, DecompileArgs};
    use scribe_core::replay::{EditOperation, Frame};

    #[test]
    fn test_json_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let mrp = dir.path().join("in.mrp");
        let json = dir.path().join("out.json");
        let back = dir.path().join("back.mrp");

        let mut excerpt = Excerpt::new("abc", 1_700_000_000_000);
        excerpt.frames.push(Frame {
            operations: vec![EditOperation::insert(1, 4, "d")],
            value: Some("abc".to_string()),
            ..Default::default()
        });
        binary::write_excerpt_file(&mrp, &excerpt).unwrap();

        decompile::execute(DecompileArgs {
            input: mrp,
            output: Some(json.clone()),
        })
        .unwrap();
        execute(CompileArgs {
            input: json,
            output: back.clone(),
        })
        .unwrap();

        assert_eq!(binary::read_excerpt_file(&back).unwrap(), excerpt);
    }
}
