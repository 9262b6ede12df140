//! Replay CLI commands
//!
//! Commands for converting, checking and playing back excerpts.

mod compile;
mod decompile;
mod render;
mod validate;

use anyhow::Result;
use clap::Subcommand;

/// Replay subcommands
#[derive(Subcommand)]
pub enum ReplayAction {
    /// Check an excerpt for structural problems and replay determinism
    Validate(validate::ValidateArgs),

    /// Convert an .mrp excerpt to JSON
    Decompile(decompile::DecompileArgs),

    /// Convert a JSON excerpt to .mrp
    Compile(compile::CompileArgs),

    /// Play an excerpt headlessly and print the resulting document
    Render(render::RenderArgs),
}

/// Execute a replay action
pub fn execute(action: ReplayAction) -> Result<()> {
    match action {
        ReplayAction::Validate(args) => validate::execute(args),
        ReplayAction::Decompile(args) => decompile::execute(args),
        ReplayAction::Compile(args) => compile::execute(args),
        ReplayAction::Render(args) => render::execute(args),
    }
}
