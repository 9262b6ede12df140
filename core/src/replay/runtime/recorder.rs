//! Excerpt recorder
//!
//! Captures editor edits, cursor/viewport state and custom events into
//! frames, one candidate frame per tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schedule::{AnimationLoop, Clock, SystemClock};
use crate::replay::binary::{self, encode_view_state};
use crate::replay::editor::{ContentChange, EditorHost};
use crate::replay::types::{CustomEvent, EditOperation, Excerpt, Frame};

/// Configuration for the recorder
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Minimum spacing between committed frames in milliseconds (0 = every tick)
    #[serde(default)]
    pub min_frame_interval_ms: u64,
}

impl RecorderConfig {
    /// Cap the frame rate, e.g. `from_fps(30)`
    pub fn from_fps(fps: u32) -> Self {
        Self {
            min_frame_interval_ms: if fps == 0 { 0 } else { 1000 / fps as u64 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// Observer invoked with every committed frame
pub type FrameHook = Box<dyn FnMut(&Frame)>;

/// Excerpt recorder state
pub struct Recorder<C: Clock = SystemClock> {
    config: RecorderConfig,
    clock: C,
    state: RecorderState,
    excerpt: Option<Excerpt>,
    /// Edits per model revision, flushed in revision order
    pending_operations: BTreeMap<u64, Vec<EditOperation>>,
    pending_events: Vec<CustomEvent>,
    last_view_state: Option<Vec<u8>>,
    last_frame_at: Option<u64>,
    subscribed: bool,
    tick_loop: AnimationLoop,
    on_frame: Option<FrameHook>,
}

impl Recorder<SystemClock> {
    /// Create a new recorder using wall-clock time
    pub fn new(config: RecorderConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Recorder<C> {
    pub fn with_clock(config: RecorderConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            state: RecorderState::Idle,
            excerpt: None,
            pending_operations: BTreeMap::new(),
            pending_events: Vec::new(),
            last_view_state: None,
            last_frame_at: None,
            subscribed: false,
            tick_loop: AnimationLoop::default(),
            on_frame: None,
        }
    }

    /// Observe committed frames (streaming, telemetry)
    pub fn set_frame_hook(&mut self, hook: impl FnMut(&Frame) + 'static) {
        self.on_frame = Some(Box::new(hook));
    }

    pub fn clear_frame_hook(&mut self) {
        self.on_frame = None;
    }

    /// Start recording, discarding any previous excerpt
    pub fn start(&mut self, editor: &impl EditorHost) {
        let now = self.clock.now_ms();
        self.start_at(editor, now);
    }

    /// Start recording with an explicit absolute start time
    pub fn start_at(&mut self, editor: &impl EditorHost, timestamp: u64) {
        self.excerpt = Some(Excerpt::new(editor.get_value(), timestamp));
        self.pending_operations.clear();
        self.pending_events.clear();
        self.last_view_state = None;
        self.last_frame_at = None;
        self.subscribed = true;
        self.state = RecorderState::Recording;
        self.tick_loop.request();

        tracing::info!(timestamp, "Recording started");
    }

    /// Stop recording; the excerpt stays available
    pub fn stop(&mut self) {
        if matches!(self.state, RecorderState::Idle | RecorderState::Stopped) {
            return;
        }

        self.subscribed = false;
        self.tick_loop.cancel();
        self.state = RecorderState::Stopped;

        tracing::info!(frames = self.frame_count(), "Recording stopped");
    }

    /// Stop committing frames; edits keep accumulating until `resume`
    pub fn pause(&mut self) {
        if self.state == RecorderState::Recording {
            self.tick_loop.cancel();
            self.state = RecorderState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RecorderState::Paused {
            self.tick_loop.request();
            self.state = RecorderState::Recording;
        }
    }

    /// Host change notification. Edits of one revision keep their order.
    pub fn on_model_content_change(&mut self, change: ContentChange) {
        if !self.subscribed {
            return;
        }

        self.pending_operations
            .entry(change.revision)
            .or_default()
            .extend(change.changes);
    }

    /// Queue a custom event for the next committed frame
    pub fn add_event(&mut self, name: impl Into<String>, payload: Option<String>) {
        if !self.is_recording() {
            return;
        }

        let timestamp = self.elapsed_ms();
        self.pending_events.push(CustomEvent {
            name: name.into(),
            timestamp,
            payload,
        });
    }

    /// Per-refresh callback. Returns true when a frame was committed.
    pub fn tick(&mut self, editor: &impl EditorHost) -> bool {
        if !self.tick_loop.fire() {
            return false;
        }

        let committed = self.generate_frame(editor);
        self.tick_loop.request();
        committed
    }

    fn generate_frame(&mut self, editor: &impl EditorHost) -> bool {
        let Some(started_at) = self.excerpt.as_ref().map(|e| e.timestamp) else {
            return false;
        };

        let now = self.clock.now_ms();
        if let Some(last) = self.last_frame_at
            && now.saturating_sub(last) < self.config.min_frame_interval_ms
        {
            return false;
        }

        let view_state = editor.save_view_state();
        let view_state_bytes = encode_view_state(&view_state);

        if self.pending_operations.is_empty()
            && self.pending_events.is_empty()
            && self.last_view_state.as_deref() == Some(view_state_bytes.as_slice())
        {
            tracing::trace!("Frame suppressed");
            return false;
        }

        let operations: Vec<EditOperation> = std::mem::take(&mut self.pending_operations)
            .into_values()
            .flatten()
            .collect();
        let events = std::mem::take(&mut self.pending_events);

        let Some(excerpt) = self.excerpt.as_mut() else {
            return false;
        };

        let frame = Frame {
            value: excerpt.frames.is_empty().then(|| excerpt.value.clone()),
            operations,
            view_state,
            timestamp: now.saturating_sub(started_at),
            events,
        };

        tracing::trace!(
            timestamp = frame.timestamp,
            operations = frame.operations.len(),
            events = frame.events.len(),
            "Frame committed"
        );

        if let Some(hook) = self.on_frame.as_mut() {
            hook(&frame);
        }
        excerpt.frames.push(frame);

        self.last_view_state = Some(view_state_bytes);
        self.last_frame_at = Some(now);
        true
    }

    fn elapsed_ms(&self) -> u64 {
        self.excerpt
            .as_ref()
            .map_or(0, |e| self.clock.now_ms().saturating_sub(e.timestamp))
    }

    /// Check if recording is active
    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording | RecorderState::Paused)
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// The excerpt being (or last) recorded
    pub fn excerpt(&self) -> Option<&Excerpt> {
        self.excerpt.as_ref()
    }

    /// Take the excerpt out, leaving the recorder idle
    pub fn take_excerpt(&mut self) -> Option<Excerpt> {
        self.stop();
        self.state = RecorderState::Idle;
        self.excerpt.take()
    }

    /// Get the number of committed frames
    pub fn frame_count(&self) -> usize {
        self.excerpt.as_ref().map_or(0, |e| e.frames.len())
    }

    /// Encode the current excerpt
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        self.excerpt.as_ref().map(binary::encode)
    }

    /// Write the current excerpt to an `.mrp` file. Does nothing before the first `start`.
    pub fn save_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        match &self.excerpt {
            Some(excerpt) => binary::write_excerpt_file(path, excerpt),
            None => Ok(()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }
}
