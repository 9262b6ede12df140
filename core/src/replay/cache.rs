//! Playback cache
//!
//! Materializes the document text every `snapshot_interval` frames so that
//! seeking only replays the operations since the nearest snapshot. The build
//! runs in slices so a long excerpt never blocks a tick for more than the
//! slice budget.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use ropey::Rope;
use serde::{Deserialize, Serialize};

use super::document::Document;
use super::types::{CustomEvent, Excerpt};

/// Cache tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Frames between snapshots
    pub snapshot_interval: usize,
    /// Time budget of one build slice in milliseconds
    pub slice_budget_ms: u64,
    /// Store snapshots LZ4-compressed
    pub compress_snapshots: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 100,
            slice_budget_ms: 25,
            compress_snapshots: false,
        }
    }
}

/// Latest state of one named event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHistory {
    /// Most recent event at or before the query time
    pub current: CustomEvent,
    /// Every event of this name up to and including `current`
    pub history: Vec<CustomEvent>,
}

/// Plain snapshots are rope clones and share structure with each other.
#[derive(Debug, Clone)]
enum Snapshot {
    Plain(Rope),
    Compressed(Vec<u8>),
}

impl Snapshot {
    fn store(rope: &Rope, compress: bool) -> Self {
        if compress {
            Snapshot::Compressed(compress_prepend_size(rope.to_string().as_bytes()))
        } else {
            Snapshot::Plain(rope.clone())
        }
    }

    fn load(&self) -> Option<Rope> {
        match self {
            Snapshot::Plain(rope) => Some(rope.clone()),
            Snapshot::Compressed(bytes) => {
                let raw = decompress_size_prepended(bytes)
                    .map_err(|e| tracing::warn!("Corrupt snapshot: {e}"))
                    .ok()?;
                let text = String::from_utf8(raw)
                    .map_err(|e| tracing::warn!("Corrupt snapshot: {e}"))
                    .ok()?;
                Some(Rope::from_str(&text))
            }
        }
    }

    fn stored_len(&self) -> usize {
        match self {
            Snapshot::Plain(rope) => rope.len_bytes(),
            Snapshot::Compressed(bytes) => bytes.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    /// Nothing built yet
    Pending,
    /// Frames before `next_frame` are folded into the scratch document
    Folding { next_frame: usize },
    Ready,
}

pub struct PlaybackCache {
    excerpt: Arc<Excerpt>,
    config: CacheConfig,
    state: BuildState,
    scratch: Document,
    snapshots: Vec<Snapshot>,
    events: HashMap<String, Vec<CustomEvent>>,
    emitted: HashMap<String, usize>,
}

impl PlaybackCache {
    pub fn new(excerpt: Arc<Excerpt>, config: CacheConfig) -> Self {
        let events = group_events(&excerpt);
        Self {
            excerpt,
            config,
            state: BuildState::Pending,
            scratch: Document::default(),
            snapshots: Vec::new(),
            events,
            emitted: HashMap::new(),
        }
    }

    pub fn excerpt(&self) -> &Arc<Excerpt> {
        &self.excerpt
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn interval(&self) -> usize {
        self.config.snapshot_interval.max(1)
    }

    /// Whether every frame has been folded in
    pub fn is_ready(&self) -> bool {
        self.state == BuildState::Ready
    }

    /// Fraction of frames folded in (1.0 once ready)
    pub fn progress(&self) -> f64 {
        let total = self.excerpt.frames.len();
        match self.state {
            BuildState::Ready => 1.0,
            BuildState::Pending => 0.0,
            BuildState::Folding { next_frame } => next_frame as f64 / total.max(1) as f64,
        }
    }

    /// Number of snapshots taken so far
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Bytes held by snapshots
    pub fn snapshot_bytes(&self) -> usize {
        self.snapshots.iter().map(Snapshot::stored_len).sum()
    }

    /// Advance the build by one frame. Returns true once ready.
    pub fn step(&mut self) -> bool {
        match self.state {
            BuildState::Ready => {}
            BuildState::Pending => {
                self.scratch.set_text(&self.excerpt.value);
                self.snapshots.clear();
                self.snapshots.push(Snapshot::store(
                    self.scratch.rope(),
                    self.config.compress_snapshots,
                ));
                self.state = if self.excerpt.frames.is_empty() {
                    BuildState::Ready
                } else {
                    BuildState::Folding { next_frame: 0 }
                };
            }
            BuildState::Folding { next_frame } => {
                let frames = &self.excerpt.frames;
                self.scratch.apply_all(&frames[next_frame].operations);

                let folded = next_frame + 1;
                let on_boundary = folded % self.interval() == 0;
                let last = folded == frames.len();
                // the final snapshot doubles as a boundary one when they coincide
                if on_boundary || last {
                    self.snapshots.push(Snapshot::store(
                        self.scratch.rope(),
                        self.config.compress_snapshots,
                    ));
                }

                self.state = if last {
                    tracing::debug!(
                        frames = frames.len(),
                        snapshots = self.snapshots.len(),
                        "Playback cache ready"
                    );
                    BuildState::Ready
                } else {
                    BuildState::Folding { next_frame: folded }
                };
            }
        }
        self.is_ready()
    }

    /// Run build steps until the slice budget elapses (at least one step).
    /// Returns true once ready.
    pub fn build_slice(&mut self) -> bool {
        let budget = Duration::from_millis(self.config.slice_budget_ms);
        let started = Instant::now();
        while !self.step() {
            if started.elapsed() >= budget {
                break;
            }
        }
        self.is_ready()
    }

    /// Build to completion
    pub fn build_all(&mut self) {
        while !self.step() {}
    }

    /// Drop everything built and start over
    pub fn rebuild(&mut self) {
        self.state = BuildState::Pending;
        self.snapshots.clear();
        self.scratch = Document::default();
        self.events = group_events(&self.excerpt);
        self.emitted.clear();
    }

    /// Document text after the first `cursor` frames have been applied.
    ///
    /// `None` when the snapshot this needs has not been built yet.
    pub fn value_at_cursor(&self, cursor: usize) -> Option<String> {
        let interval = self.interval();
        // clamping keeps `k` on a boundary snapshot, never the trailing final one
        let cursor = cursor.min(self.excerpt.frames.len());
        let k = cursor / interval;
        let snapshot = self.snapshots.get(k)?;

        let mut document = Document::from(snapshot.load()?);
        for frame in &self.excerpt.frames[k * interval..cursor] {
            document.apply_all(&frame.operations);
        }
        Some(document.text())
    }

    /// Text after every frame. `None` until ready.
    pub fn final_value(&self) -> Option<String> {
        if !self.is_ready() {
            return None;
        }
        self.snapshots.last()?.load().map(|rope| rope.to_string())
    }

    /// Latest event of each name at `timestamp_ms`, skipping names whose
    /// history did not change since the previous call.
    pub fn events_as_of(&mut self, timestamp_ms: f64) -> BTreeMap<String, EventHistory> {
        let mut updates = BTreeMap::new();

        for (name, events) in &self.events {
            let index = events.partition_point(|event| event.timestamp as f64 <= timestamp_ms);
            if index == 0 {
                self.emitted.insert(name.clone(), 0);
                continue;
            }
            if self.emitted.get(name) == Some(&index) {
                continue;
            }
            self.emitted.insert(name.clone(), index);

            let history = events[..index].to_vec();
            let current = history[index - 1].clone();
            updates.insert(name.clone(), EventHistory { current, history });
        }

        updates
    }

    /// Forget what `events_as_of` already reported
    pub fn reset_event_memory(&mut self) {
        self.emitted.clear();
    }
}

fn group_events(excerpt: &Excerpt) -> HashMap<String, Vec<CustomEvent>> {
    let mut groups: HashMap<String, Vec<CustomEvent>> = HashMap::new();
    for event in excerpt.events() {
        groups
            .entry(event.name.clone())
            .or_default()
            .push(event.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::document::replay_text;
    use crate::replay::types::{EditOperation, Frame};

    fn frame(timestamp: u64, operations: Vec<EditOperation>) -> Frame {
        Frame {
            operations,
            timestamp,
            ..Default::default()
        }
    }

    fn abc_excerpt() -> Arc<Excerpt> {
        let mut excerpt = Excerpt::new("abc", 0);
        excerpt.frames = vec![
            frame(0, vec![EditOperation::insert(1, 4, "d")]),
            frame(50, vec![EditOperation::insert(1, 1, "X")]),
        ];
        excerpt.frames[0].value = Some("abc".to_string());
        Arc::new(excerpt)
    }

    fn typing_excerpt(frames: usize) -> Arc<Excerpt> {
        let mut excerpt = Excerpt::new("", 0);
        for i in 0..frames {
            let line = (i / 10) as u32 + 1;
            let text = if i % 10 == 9 { "\n" } else { "x" };
            excerpt
                .frames
                .push(frame(i as u64 * 16, vec![EditOperation::insert(line, 100, text)]));
        }
        Arc::new(excerpt)
    }

    fn cache(excerpt: Arc<Excerpt>, snapshot_interval: usize) -> PlaybackCache {
        PlaybackCache::new(
            excerpt,
            CacheConfig {
                snapshot_interval,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_value_at_cursor() {
        let mut cache = cache(abc_excerpt(), 100);
        cache.build_all();

        assert_eq!(cache.value_at_cursor(0).as_deref(), Some("abc"));
        assert_eq!(cache.value_at_cursor(1).as_deref(), Some("abcd"));
        assert_eq!(cache.value_at_cursor(2).as_deref(), Some("Xabcd"));
        assert_eq!(cache.value_at_cursor(9).as_deref(), Some("Xabcd"));
        assert_eq!(cache.final_value().as_deref(), Some("Xabcd"));
    }

    #[test]
    fn test_not_ready_before_build() {
        let mut cache = cache(abc_excerpt(), 1);
        assert_eq!(cache.value_at_cursor(0), None);
        assert_eq!(cache.final_value(), None);
        assert_eq!(cache.progress(), 0.0);

        cache.step();
        assert_eq!(cache.value_at_cursor(0).as_deref(), Some("abc"));
        assert_eq!(cache.value_at_cursor(1), None);

        cache.step();
        assert_eq!(cache.value_at_cursor(1).as_deref(), Some("abcd"));
        assert!(!cache.is_ready());
        assert_eq!(cache.progress(), 0.5);

        assert!(cache.step());
        assert_eq!(cache.progress(), 1.0);
    }

    #[test]
    fn test_every_interval_matches_linear_replay() {
        let excerpt = typing_excerpt(45);
        for interval in [1, 7, 100] {
            let mut cache = cache(excerpt.clone(), interval);
            cache.build_all();
            for cursor in 0..=excerpt.frames.len() {
                let expected = replay_text(
                    &excerpt.value,
                    excerpt.frames[..cursor].iter().flat_map(|f| f.operations.iter()),
                );
                assert_eq!(
                    cache.value_at_cursor(cursor),
                    Some(expected),
                    "interval {interval} cursor {cursor}"
                );
            }
        }
    }

    #[test]
    fn test_snapshot_layout() {
        let mut cache = cache(typing_excerpt(14), 7);
        cache.build_all();
        // initial, after 7, after 14
        assert_eq!(cache.snapshot_count(), 3);

        let mut cache = self::cache(typing_excerpt(15), 7);
        cache.build_all();
        // initial, after 7, after 14, final
        assert_eq!(cache.snapshot_count(), 4);
    }

    #[test]
    fn test_compressed_snapshots() {
        let excerpt = typing_excerpt(60);
        let mut plain = cache(excerpt.clone(), 7);
        let mut packed = PlaybackCache::new(
            excerpt.clone(),
            CacheConfig {
                snapshot_interval: 7,
                compress_snapshots: true,
                ..Default::default()
            },
        );
        plain.build_all();
        packed.build_all();

        for cursor in [0, 6, 7, 30, 60] {
            assert_eq!(plain.value_at_cursor(cursor), packed.value_at_cursor(cursor));
        }
        assert_eq!(plain.final_value(), packed.final_value());
    }

    #[test]
    fn test_build_slice_progresses() {
        let mut cache = PlaybackCache::new(
            typing_excerpt(500),
            CacheConfig {
                snapshot_interval: 10,
                slice_budget_ms: 0,
                compress_snapshots: false,
            },
        );
        // a zero budget still makes progress
        assert!(!cache.build_slice());
        assert!(!cache.build_slice());
        assert!(cache.progress() > 0.0);

        while !cache.build_slice() {}
        assert!(cache.is_ready());
    }

    #[test]
    fn test_empty_excerpt() {
        let mut cache = cache(Arc::new(Excerpt::new("hello", 0)), 100);
        assert!(cache.step());
        assert_eq!(cache.value_at_cursor(0).as_deref(), Some("hello"));
        assert_eq!(cache.final_value().as_deref(), Some("hello"));
    }

    #[test]
    fn test_rebuild() {
        let mut cache = cache(abc_excerpt(), 1);
        cache.build_all();
        cache.rebuild();
        assert!(!cache.is_ready());
        assert_eq!(cache.value_at_cursor(0), None);
        cache.build_all();
        assert_eq!(cache.value_at_cursor(2).as_deref(), Some("Xabcd"));
    }

    fn marker_excerpt() -> Arc<Excerpt> {
        let mut excerpt = Excerpt::new("", 0);
        for ts in [10, 20, 30] {
            let mut f = frame(ts, Vec::new());
            f.events.push(CustomEvent {
                name: "marker".to_string(),
                timestamp: ts,
                payload: None,
            });
            excerpt.frames.push(f);
        }
        Arc::new(excerpt)
    }

    #[test]
    fn test_events_as_of() {
        let mut cache = cache(marker_excerpt(), 100);

        let updates = cache.events_as_of(25.0);
        let marker = &updates["marker"];
        let stamps: Vec<u64> = marker.history.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![10, 20]);
        assert_eq!(marker.current.timestamp, 20);

        // unchanged history is not reported again
        assert!(cache.events_as_of(25.0).is_empty());
        assert!(cache.events_as_of(29.0).is_empty());

        let updates = cache.events_as_of(35.0);
        assert_eq!(updates["marker"].history.len(), 3);
        assert_eq!(updates["marker"].current.timestamp, 30);
    }

    #[test]
    fn test_events_before_first_occurrence() {
        let mut cache = cache(marker_excerpt(), 100);
        assert!(cache.events_as_of(5.0).is_empty());

        cache.events_as_of(15.0);
        // scrubbing back before the first event resets the memory
        assert!(cache.events_as_of(5.0).is_empty());
        assert_eq!(cache.events_as_of(15.0)["marker"].history.len(), 1);
    }

    #[test]
    fn test_reset_event_memory() {
        let mut cache = cache(marker_excerpt(), 100);
        cache.events_as_of(35.0);
        assert!(cache.events_as_of(35.0).is_empty());
        cache.reset_event_memory();
        assert_eq!(cache.events_as_of(35.0)["marker"].history.len(), 3);
    }
}
