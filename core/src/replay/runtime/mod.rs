//! Replay runtime
//!
//! This module contains the live side of the replay system:
//! - **Schedule**: Clocks and the tick request loop
//! - **Recorder**: Captures editor sessions into excerpts
//! - **Player**: Plays excerpts back into an editor

mod events;
mod player;
mod recorder;
mod schedule;

pub use events::{PlaybackSpeed, PlayerEvent, UnsupportedSpeed};
pub use player::{ExcerptSource, LoadError, Player, PlayerConfig, PlayerState, SeekResult};
pub use recorder::{FrameHook, Recorder, RecorderConfig, RecorderState};
pub use schedule::{AnimationLoop, Clock, FrameRequest, ManualClock, SystemClock};
