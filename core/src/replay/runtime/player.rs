//! Excerpt player
//!
//! Drives an [`EditorHost`] through a recorded excerpt. Each tick advances a
//! virtual clock by the elapsed wall time scaled by the playback speed, then
//! applies every frame whose timestamp has been reached.
//!
//! `position` is the number of frames whose effect is visible; the frame
//! under the cursor is `position - 1`.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::events::{PlaybackSpeed, PlayerEvent};
use super::schedule::{AnimationLoop, Clock, SystemClock};
use crate::replay::binary::{self, MalformedRecordError};
use crate::replay::cache::{CacheConfig, PlaybackCache};
use crate::replay::editor::EditorHost;
use crate::replay::types::Excerpt;

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub speed: PlaybackSpeed,
    /// Restart from the beginning when reaching the end
    pub loop_playback: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: PlaybackSpeed::Normal,
            loop_playback: false,
        }
    }
}

/// Anything the player can load
#[derive(Debug, Clone)]
pub enum ExcerptSource {
    /// Encoded `.mrp` bytes
    Bytes(Vec<u8>),
    Excerpt(Arc<Excerpt>),
}

impl From<Vec<u8>> for ExcerptSource {
    fn from(bytes: Vec<u8>) -> Self {
        ExcerptSource::Bytes(bytes)
    }
}

impl From<Excerpt> for ExcerptSource {
    fn from(excerpt: Excerpt) -> Self {
        ExcerptSource::Excerpt(Arc::new(excerpt))
    }
}

impl From<Arc<Excerpt>> for ExcerptSource {
    fn from(excerpt: Arc<Excerpt>) -> Self {
        ExcerptSource::Excerpt(excerpt)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to decode excerpt: {0}")]
    Decode(#[from] MalformedRecordError),
}

/// Result of a seek operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekResult {
    /// Editor now shows the target frame
    Applied,
    /// The cache has not built the needed snapshot yet; nothing changed
    NotReady,
    /// No excerpt loaded, or it has no frames
    Empty,
    /// Target is NaN or infinite; nothing changed
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No excerpt loaded
    Stopped,
    Loaded,
    Playing,
    Paused,
    Ended,
}

struct Loaded {
    excerpt: Arc<Excerpt>,
    cache: PlaybackCache,
}

/// Excerpt player state
pub struct Player<E: EditorHost, C: Clock = SystemClock> {
    editor: E,
    clock: C,
    config: PlayerConfig,
    cache_config: CacheConfig,
    loaded: Option<Loaded>,
    state: PlayerState,
    position: usize,
    /// Virtual time in milliseconds since the excerpt start
    time_ms: f64,
    last_tick_at: u64,
    tick_loop: AnimationLoop,
    controls: bool,
    events: VecDeque<PlayerEvent>,
}

impl<E: EditorHost> Player<E, SystemClock> {
    /// Create a new player driving `editor` in wall-clock time
    pub fn new(editor: E, config: PlayerConfig, cache_config: CacheConfig) -> Self {
        Self::with_clock(editor, config, cache_config, SystemClock)
    }
}

impl<E: EditorHost, C: Clock> Player<E, C> {
    pub fn with_clock(editor: E, config: PlayerConfig, cache_config: CacheConfig, clock: C) -> Self {
        Self {
            editor,
            clock,
            config,
            cache_config,
            loaded: None,
            state: PlayerState::Stopped,
            position: 0,
            time_ms: 0.0,
            last_tick_at: 0,
            tick_loop: AnimationLoop::default(),
            controls: true,
            events: VecDeque::new(),
        }
    }

    /// Load an excerpt, replacing the current one. The editor becomes read-only
    /// and shows the initial text.
    pub fn load(&mut self, source: impl Into<ExcerptSource>) -> Result<(), LoadError> {
        let excerpt = match source.into() {
            ExcerptSource::Excerpt(excerpt) => excerpt,
            ExcerptSource::Bytes(bytes) => match binary::decode(&bytes) {
                Ok(excerpt) => Arc::new(excerpt),
                Err(e) => {
                    tracing::warn!("Failed to load excerpt: {e}");
                    self.events.push_back(PlayerEvent::Error {
                        error: e.to_string(),
                    });
                    return Err(e.into());
                }
            },
        };

        tracing::info!(
            frames = excerpt.frames.len(),
            duration_ms = excerpt.duration_ms(),
            "Excerpt loaded"
        );

        self.tick_loop.cancel();
        if self.state == PlayerState::Playing {
            self.events.push_back(PlayerEvent::Status { playing: false });
        }
        let cache = PlaybackCache::new(excerpt.clone(), self.cache_config.clone());
        self.loaded = Some(Loaded { excerpt, cache });
        self.state = PlayerState::Loaded;
        self.editor.set_read_only(true);
        self.rewind();
        Ok(())
    }

    /// Start or resume playback. From the end, restarts at frame 0.
    pub fn play(&mut self) {
        if self.loaded.is_none() || self.state == PlayerState::Playing {
            return;
        }
        if self.is_ended() {
            self.rewind();
        }

        self.state = PlayerState::Playing;
        self.last_tick_at = self.clock.now_ms();
        self.tick_loop.request();
        self.events.push_back(PlayerEvent::Status { playing: true });
    }

    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.tick_loop.cancel();
        self.state = PlayerState::Paused;
        self.events.push_back(PlayerEvent::Status { playing: false });
    }

    /// Go back to frame 0, keeping the playing state
    pub fn reload(&mut self) {
        if self.loaded.is_none() {
            return;
        }
        self.rewind();
        if self.state == PlayerState::Ended {
            self.state = PlayerState::Loaded;
        }
        self.events.push_back(PlayerEvent::TimeUpdate);
    }

    fn rewind(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        loaded.cache.reset_event_memory();
        self.position = 0;
        self.time_ms = 0.0;
        self.last_tick_at = self.clock.now_ms();
        if self.editor.has_model() {
            self.editor.set_value(&loaded.excerpt.value);
        }
    }

    /// Per-refresh callback. Returns false when no tick was scheduled.
    pub fn tick(&mut self) -> bool {
        if !self.tick_loop.fire() {
            return false;
        }
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };

        if !loaded.cache.is_ready() {
            loaded.cache.build_slice();
        }

        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(self.last_tick_at) as f64;
        self.last_tick_at = now;
        self.time_ms += elapsed * self.config.speed.factor();

        let target = loaded.excerpt.frames_visible_at(self.time_ms);
        self.advance_to(target);

        let frame_count = self.frame_count();
        if self.position >= frame_count {
            if self.config.loop_playback && frame_count > 0 {
                tracing::debug!("Looping playback");
                self.rewind();
                self.tick_loop.request();
            } else {
                self.tick_loop.cancel();
                self.state = PlayerState::Ended;
                self.events.push_back(PlayerEvent::Status { playing: false });
                tracing::debug!("Playback ended");
            }
        } else {
            self.tick_loop.request();
        }
        true
    }

    // Apply frames [position, target) incrementally
    fn advance_to(&mut self, target: usize) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        if target > self.position {
            if self.editor.has_model() {
                for frame in &loaded.excerpt.frames[self.position..target] {
                    self.editor.push_edit_operations(&frame.operations);
                }
                self.editor
                    .restore_view_state(&loaded.excerpt.frames[target - 1].view_state);
            }
            self.position = target;
        }

        self.events.push_back(PlayerEvent::TimeUpdate);
        for history in loaded.cache.events_as_of(self.time_ms).into_values() {
            self.events.push_back(PlayerEvent::Custom(history));
        }
    }

    /// Jump to a fraction of the duration (clamped to 0..=1)
    pub fn seek(&mut self, progress: f64) -> SeekResult {
        if !progress.is_finite() {
            return SeekResult::Rejected;
        }
        let duration_ms = self.duration_ms() as f64;
        self.seek_to_time(progress.clamp(0.0, 1.0) * duration_ms)
    }

    fn seek_to_time(&mut self, time_ms: f64) -> SeekResult {
        let Some(loaded) = self.loaded.as_mut() else {
            return SeekResult::Empty;
        };
        if loaded.excerpt.frames.is_empty() {
            return SeekResult::Empty;
        }

        let position = loaded.excerpt.frames_visible_at(time_ms);
        let Some(text) = loaded.cache.value_at_cursor(position) else {
            tracing::debug!(position, "Seek target not cached yet");
            return SeekResult::NotReady;
        };

        if self.editor.has_model() {
            self.editor.set_value(&text);
            if let Some(frame) = position.checked_sub(1).map(|i| &loaded.excerpt.frames[i]) {
                self.editor.restore_view_state(&frame.view_state);
            }
        }

        self.position = position;
        self.time_ms = time_ms;
        self.last_tick_at = self.clock.now_ms();
        if self.state == PlayerState::Ended && position < loaded.excerpt.frames.len() {
            self.state = PlayerState::Paused;
        }

        self.events.push_back(PlayerEvent::TimeUpdate);
        for history in loaded.cache.events_as_of(time_ms).into_values() {
            self.events.push_back(PlayerEvent::Custom(history));
        }
        SeekResult::Applied
    }

    /// Advance the cache build by one slice. Returns true once ready.
    pub fn build_cache_slice(&mut self) -> bool {
        self.loaded
            .as_mut()
            .is_some_and(|loaded| loaded.cache.build_slice())
    }

    /// Drain queued notifications
    pub fn poll_events(&mut self) -> Vec<PlayerEvent> {
        self.events.drain(..).collect()
    }

    /// Not playing and every frame applied
    pub fn is_ended(&self) -> bool {
        self.loaded.is_some()
            && self.state != PlayerState::Playing
            && self.position >= self.frame_count()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Number of frames applied
    pub fn position(&self) -> usize {
        self.position
    }

    /// Index of the frame currently shown
    pub fn cursor(&self) -> usize {
        self.position.saturating_sub(1)
    }

    pub fn frame_count(&self) -> usize {
        self.loaded
            .as_ref()
            .map_or(0, |loaded| loaded.excerpt.frames.len())
    }

    fn duration_ms(&self) -> u64 {
        self.loaded
            .as_ref()
            .map_or(0, |loaded| loaded.excerpt.duration_ms())
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }

    /// Playback time in seconds
    pub fn current_time(&self) -> f64 {
        self.time_ms.min(self.duration_ms() as f64) / 1000.0
    }

    pub fn set_current_time(&mut self, seconds: f64) -> SeekResult {
        if !seconds.is_finite() {
            return SeekResult::Rejected;
        }
        let time_ms = (seconds * 1000.0).clamp(0.0, self.duration_ms() as f64);
        self.seek_to_time(time_ms)
    }

    /// Playback progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        let duration_ms = self.duration_ms();
        if duration_ms == 0 {
            return if self.frame_count() > 0 && self.position >= self.frame_count() {
                1.0
            } else {
                0.0
            };
        }
        (self.time_ms / duration_ms as f64).clamp(0.0, 1.0)
    }

    pub fn set_progress(&mut self, progress: f64) -> SeekResult {
        self.seek(progress)
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.config.speed
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.config.speed = speed;
        self.events.push_back(PlayerEvent::Speed { speed });
    }

    /// Whether the host should show its control bar
    pub fn controls(&self) -> bool {
        self.controls
    }

    pub fn set_controls(&mut self, controls: bool) {
        self.controls = controls;
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn excerpt(&self) -> Option<&Arc<Excerpt>> {
        self.loaded.as_ref().map(|loaded| &loaded.excerpt)
    }

    pub fn cache(&self) -> Option<&PlaybackCache> {
        self.loaded.as_ref().map(|loaded| &loaded.cache)
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn into_editor(self) -> E {
        self.editor
    }
}
