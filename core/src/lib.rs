//! Scribe Core - editor session recording and playback
//!
//! This crate records the edits, cursors and viewport of a code editor into
//! compact excerpts and replays them deterministically, with seeking and
//! variable speed.
//!
//! # Architecture
//!
//! - [`Recorder`] - Captures editor changes into frames
//! - [`Player`] - Replays an excerpt into an [`EditorHost`]
//! - [`PlaybackCache`] - Snapshots document text for fast seeking
//! - [`replay::binary`] - The `.mrp` wire format

pub mod config;
pub mod replay;

pub use config::ScribeConfig;
pub use replay::{
    CacheConfig, EditOperation, EditorHost, Excerpt, Frame, MalformedRecordError, MemoryEditor,
    PlaybackCache, Player, PlayerConfig, PlayerEvent, Recorder, RecorderConfig, SeekResult,
};
