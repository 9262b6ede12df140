//! Core types for the replay system
//!
//! This module defines the records captured by the recorder, stored in
//! `.mrp` files and consumed by the playback cache and player.

use serde::{Deserialize, Serialize};

/// Line/column pair, 1-based like the host editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// Text range. Start and end may coincide (an insertion point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Range {
    pub const fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Zero-width range at a position
    pub const fn caret(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_column)
    }

    pub fn is_empty(&self) -> bool {
        self.start() == self.end()
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::caret(1, 1)
    }
}

/// Single range replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub range: Range,
    /// Replacement text; `None` deletes the range
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_move_markers: Option<bool>,
}

impl EditOperation {
    pub fn insert(line: u32, column: u32, text: impl Into<String>) -> Self {
        Self {
            range: Range::caret(line, column),
            text: Some(text.into()),
            force_move_markers: None,
        }
    }

    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: Some(text.into()),
            force_move_markers: None,
        }
    }

    pub fn delete(range: Range) -> Self {
        Self {
            range,
            text: None,
            force_move_markers: None,
        }
    }
}

/// Scroll/viewport portion of the editor view state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_top: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_top_without_view_zones: Option<i32>,
    pub scroll_left: i32,
    pub first_position: Position,
    pub first_position_delta_top: i32,
}

/// One cursor of a (possibly multi-cursor) selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorState {
    pub in_selection_mode: bool,
    pub selection_start: Position,
    pub position: Position,
}

impl CursorState {
    /// Collapsed cursor at a position
    pub fn at(position: Position) -> Self {
        Self {
            in_selection_mode: false,
            selection_start: position,
            position,
        }
    }
}

/// Cursors plus viewport, as saved by the host editor.
///
/// Compared by encoded bytes when the recorder decides whether a tick
/// produced anything new.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditorViewState {
    pub cursor_state: Vec<CursorState>,
    pub view_state: ViewState,
}

/// Out-of-band application event interleaved with edits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub name: String,
    /// Milliseconds since the excerpt started
    pub timestamp: u64,
    /// Opaque payload, usually JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// One committed tick of the recording
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub operations: Vec<EditOperation>,
    pub view_state: EditorViewState,
    /// Milliseconds since the excerpt started
    pub timestamp: u64,
    /// Full document text, only on the first frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub events: Vec<CustomEvent>,
}

impl Frame {
    /// True when the frame carries neither edits nor events
    pub fn is_idle(&self) -> bool {
        self.operations.is_empty() && self.events.is_empty()
    }
}

/// A complete recorded session (in-memory representation)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Excerpt {
    /// Document text when recording started
    pub value: String,
    pub frames: Vec<Frame>,
    /// Absolute recording start, milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl Excerpt {
    pub fn new(value: impl Into<String>, timestamp: u64) -> Self {
        Self {
            value: value.into(),
            frames: Vec::new(),
            timestamp,
        }
    }

    /// Timestamp of the last frame in milliseconds (0 when empty)
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map_or(0, |frame| frame.timestamp)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn operation_count(&self) -> usize {
        self.frames.iter().map(|frame| frame.operations.len()).sum()
    }

    /// Iterate over every custom event in recording order
    pub fn events(&self) -> impl Iterator<Item = &CustomEvent> {
        self.frames.iter().flat_map(|frame| frame.events.iter())
    }

    /// Index of the first frame whose timestamp is strictly after `time_ms`.
    ///
    /// This is the number of frames whose effect is visible at `time_ms`.
    pub fn frames_visible_at(&self, time_ms: f64) -> usize {
        self.frames
            .partition_point(|frame| frame.timestamp as f64 <= time_ms)
    }
}
