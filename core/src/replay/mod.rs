//! Scribe Replay System
//!
//! Records editor sessions as a sequence of frames and plays them back:
//!
//! - **Binary format (`.mrp`)** for compact storage of recorded excerpts
//! - **Playback cache** for fast seeking through long edit histories
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                   Recording Mode                          │
//! │ editor edits → Recorder → Excerpt → .mrp (binary)         │
//! └───────────────────────────────────────────────────────────┘
//!
//! ┌───────────────────────────────────────────────────────────┐
//! │                   Playback Mode                           │
//! │ .mrp → Player → PlaybackCache → editor                    │
//! │                      │                                    │
//! │          snapshots every N frames                         │
//! │          replay delta operations on seek                  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ## Recording
//!
//! ```ignore
//! use scribe_core::replay::{MemoryEditor, Recorder, RecorderConfig};
//!
//! let mut editor = MemoryEditor::new("fn main() {}");
//! let mut recorder = Recorder::new(RecorderConfig::default());
//! recorder.start(&editor);
//!
//! // Once per display refresh:
//! for change in editor.take_changes() {
//!     recorder.on_model_content_change(change);
//! }
//! recorder.tick(&editor);
//!
//! recorder.stop();
//! recorder.save_to_file(Path::new("session.mrp"))?;
//! ```
//!
//! ## Playback
//!
//! ```ignore
//! use scribe_core::replay::{CacheConfig, MemoryEditor, Player, PlayerConfig};
//!
//! let mut player = Player::new(MemoryEditor::default(), PlayerConfig::default(), CacheConfig::default());
//! player.load(std::fs::read("session.mrp")?)?;
//! player.play();
//!
//! // Once per display refresh:
//! player.tick();
//! for event in player.poll_events() {
//!     // update the control bar
//! }
//! ```

pub mod binary;
pub mod cache;
pub mod document;
pub mod editor;
pub mod runtime;
pub mod types;
pub mod validation;

// Re-export core types
pub use types::{
    CursorState, CustomEvent, EditOperation, EditorViewState, Excerpt, Frame, Position, Range,
    ViewState,
};

// Re-export binary format
pub use binary::{BinaryReader, BinaryWriter, MalformedRecordError};

pub use cache::{CacheConfig, EventHistory, PlaybackCache};
pub use document::{Document, replay_text};
pub use editor::{ContentChange, EditorHost, MemoryEditor};
pub use validation::ValidationIssue;

// Re-export runtime
pub use runtime::{
    AnimationLoop, Clock, ExcerptSource, LoadError, ManualClock, PlaybackSpeed, Player,
    PlayerConfig, PlayerEvent, PlayerState, Recorder, RecorderConfig, RecorderState, SeekResult,
    SystemClock,
};
