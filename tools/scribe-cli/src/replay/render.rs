//! Headless playback
//!
//! Drives a [`Player`] against an in-memory editor with a manual clock, so a
//! recording plays back as fast as the CPU allows.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;

use scribe_core::config;
use scribe_core::replay::{
    ManualClock, MemoryEditor, PlaybackSpeed, Player, PlayerEvent, SeekResult,
};

/// Simulated display refresh interval
const TICK_MS: u64 = 16;

#[derive(Args)]
pub struct RenderArgs {
    /// Excerpt file (.mrp)
    pub input: PathBuf,

    /// Seek to this time in seconds
    #[arg(long, conflicts_with = "progress")]
    pub at: Option<f64>,

    /// Seek to this fraction of the duration (0.0 to 1.0)
    #[arg(long)]
    pub progress: Option<f64>,

    /// Playback speed when playing to the end (0.5, 1, 1.5 or 2)
    #[arg(long, value_parser = parse_speed)]
    pub speed: Option<PlaybackSpeed>,

    /// Print custom events as they are reached
    #[arg(long)]
    pub events: bool,
}

fn parse_speed(s: &str) -> Result<PlaybackSpeed, String> {
    let factor: f64 = s.parse().map_err(|e| format!("{e}"))?;
    PlaybackSpeed::try_from(factor).map_err(|e| e.to_string())
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let settings = config::load();
    let mut player_config = settings.player;
    if let Some(speed) = args.speed {
        player_config.speed = speed;
    }
    player_config.loop_playback = false;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let clock = ManualClock::new(0);
    let mut player = Player::with_clock(
        MemoryEditor::default(),
        player_config,
        settings.cache,
        clock.clone(),
    );
    player.load(bytes)?;

    let seek = match (args.at, args.progress) {
        (Some(seconds), _) => Some(Target::Time(seconds)),
        (None, Some(progress)) => Some(Target::Progress(progress)),
        (None, None) => None,
    };

    match seek {
        Some(target) => {
            while !player.build_cache_slice() {}
            let result = match target {
                Target::Time(seconds) => player.set_current_time(seconds),
                Target::Progress(progress) => player.set_progress(progress),
            };
            match result {
                SeekResult::NotReady => bail!("Playback cache is not ready"),
                SeekResult::Rejected => bail!("Seek target must be a finite number"),
                SeekResult::Applied | SeekResult::Empty => {}
            }
            tracing::info!(
                position = player.position(),
                time = player.current_time(),
                "Seek complete"
            );
        }
        None => {
            player.play();
            let mut ticks = 0u64;
            while player.tick() {
                ticks += 1;
                clock.advance(TICK_MS);
            }
            tracing::info!(
                ticks,
                speed = %player.speed(),
                "Played {:.3}s of recording",
                player.duration()
            );
        }
    }

    if args.events {
        for event in player.poll_events() {
            if let PlayerEvent::Custom(history) = event {
                eprintln!(
                    "[{} ms] {} {}",
                    history.current.timestamp,
                    history.current.name,
                    history.current.payload.as_deref().unwrap_or("")
                );
            }
        }
    }

    print!("{}", player.editor().text());
    Ok(())
}

enum Target {
    Time(f64),
    Progress(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speed() {
        assert_eq!(parse_speed("2"), Ok(PlaybackSpeed::Double));
        assert_eq!(parse_speed("0.5"), Ok(PlaybackSpeed::Half));
        assert!(parse_speed("3").is_err());
        assert!(parse_speed("fast").is_err());
    }
}
