//! Property-based invariant tests for recording, encoding and playback.
//!
//! These tests verify invariants that must hold for any excerpt:
//!
//! 1. decode(encode(E)) == E.
//! 2. Decoding arbitrary or truncated bytes never panics.
//! 3. Cached text at every cursor matches a linear replay, for any snapshot interval.
//! 4. The player's position never moves backwards while playing.
//! 5. A recorded session replays to the editor text at every frame boundary.
//! 6. No two consecutive committed frames are idle with identical view states.

use std::sync::Arc;

use proptest::prelude::*;
use scribe_core::replay::{
    CacheConfig, CursorState, CustomEvent, EditOperation, EditorHost, EditorViewState, Excerpt,
    Frame, ManualClock, MemoryEditor, PlaybackCache, Player, PlayerConfig, Position, Range,
    Recorder, RecorderConfig, ViewState, binary, replay_text,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn arb_position() -> impl Strategy<Value = Position> {
    (0u32..8, 0u32..16).prop_map(|(line, column)| Position::new(line, column))
}

fn arb_range() -> impl Strategy<Value = Range> {
    (arb_position(), arb_position())
        .prop_map(|(a, b)| Range::new(a.line, a.column, b.line, b.column))
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-z \\né]{0,6}"
}

fn arb_operation() -> impl Strategy<Value = EditOperation> {
    (
        arb_range(),
        proptest::option::of(arb_text()),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(range, text, force_move_markers)| EditOperation {
            range,
            text,
            force_move_markers,
        })
}

fn arb_view_state() -> impl Strategy<Value = EditorViewState> {
    (
        proptest::collection::vec(
            (any::<bool>(), arb_position(), arb_position()).prop_map(
                |(in_selection_mode, selection_start, position)| CursorState {
                    in_selection_mode,
                    selection_start,
                    position,
                },
            ),
            0..3,
        ),
        proptest::option::of(-500i32..5000),
        proptest::option::of(any::<i32>()),
        any::<i32>(),
        arb_position(),
        -40i32..40,
    )
        .prop_map(
            |(cursor_state, scroll_top, without_zones, scroll_left, first_position, delta)| {
                EditorViewState {
                    cursor_state,
                    view_state: ViewState {
                        scroll_top,
                        scroll_top_without_view_zones: without_zones,
                        scroll_left,
                        first_position,
                        first_position_delta_top: delta,
                    },
                }
            },
        )
}

fn arb_event() -> impl Strategy<Value = CustomEvent> {
    (
        "(run|save|marker)",
        0u64..10_000,
        proptest::option::of("[{}a-z:\"]{0,10}"),
    )
        .prop_map(|(name, timestamp, payload)| CustomEvent {
            name,
            timestamp,
            payload,
        })
}

fn arb_frames(max: usize) -> impl Strategy<Value = Vec<Frame>> {
    proptest::collection::vec(
        (
            0u64..100,
            proptest::collection::vec(arb_operation(), 0..4),
            arb_view_state(),
            proptest::collection::vec(arb_event(), 0..2),
        ),
        0..max,
    )
    .prop_map(|raw| {
        let mut timestamp = 0;
        raw.into_iter()
            .map(|(delta, operations, view_state, events)| {
                timestamp += delta;
                Frame {
                    operations,
                    view_state,
                    timestamp,
                    value: None,
                    events,
                }
            })
            .collect()
    })
}

fn arb_excerpt(max_frames: usize) -> impl Strategy<Value = Excerpt> {
    ("[a-z\\n]{0,20}", arb_frames(max_frames), any::<u64>()).prop_map(
        |(value, mut frames, timestamp)| {
            if let Some(first) = frames.first_mut() {
                first.value = Some(value.clone());
            }
            Excerpt {
                value,
                frames,
                timestamp,
            }
        },
    )
}

fn linear_text(excerpt: &Excerpt, cursor: usize) -> String {
    replay_text(
        &excerpt.value,
        excerpt.frames[..cursor]
            .iter()
            .flat_map(|frame| frame.operations.iter()),
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Codec round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn encode_decode_roundtrip(excerpt in arb_excerpt(12)) {
        let bytes = binary::encode(&excerpt);
        let decoded = binary::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, excerpt);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Malformed input is an error, never a panic
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = binary::decode(&bytes);
    }

    #[test]
    fn truncated_encoding_never_panics(excerpt in arb_excerpt(6), cut in any::<prop::sample::Index>()) {
        let bytes = binary::encode(&excerpt);
        let end = cut.index(bytes.len() + 1);
        let _ = binary::decode(&bytes[..end]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Cache correctness for any snapshot interval
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cache_matches_linear_replay(
        excerpt in arb_excerpt(30),
        interval in prop::sample::select(vec![1usize, 7, 100]),
        compress in any::<bool>(),
    ) {
        let excerpt = Arc::new(excerpt);
        let mut cache = PlaybackCache::new(
            excerpt.clone(),
            CacheConfig {
                snapshot_interval: interval,
                compress_snapshots: compress,
                ..Default::default()
            },
        );
        cache.build_all();

        for cursor in 0..=excerpt.frames.len() {
            prop_assert_eq!(
                cache.value_at_cursor(cursor),
                Some(linear_text(&excerpt, cursor)),
                "interval {} cursor {}", interval, cursor
            );
        }
        prop_assert_eq!(cache.final_value(), Some(linear_text(&excerpt, excerpt.frames.len())));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Cursor monotonicity during playback
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn playback_position_is_monotonic(
        excerpt in arb_excerpt(25),
        steps in proptest::collection::vec(0u64..40, 1..200),
    ) {
        let clock = ManualClock::new(0);
        let mut player = Player::with_clock(
            MemoryEditor::default(),
            PlayerConfig::default(),
            CacheConfig { snapshot_interval: 5, ..Default::default() },
            clock.clone(),
        );
        player.load(excerpt.clone()).unwrap();
        player.play();

        let mut last = 0;
        for step in steps {
            if !player.tick() {
                break;
            }
            prop_assert!(player.position() >= last);
            last = player.position();
            prop_assert_eq!(player.editor().text(), linear_text(&excerpt, last));
            clock.advance(step);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5 & 6. Recording determinism and suppression
// ═════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Action {
    Type(Vec<EditOperation>),
    Move(Position),
    Scroll(i32),
    Event(String),
    Wait(u64),
}

// Host editors never emit line or column 0
fn arb_typed_operation() -> impl Strategy<Value = EditOperation> {
    (1u32..6, 1u32..12, 1u32..6, 1u32..12, proptest::option::of(arb_text())).prop_map(
        |(start_line, start_column, end_line, end_column, text)| EditOperation {
            range: Range::new(start_line, start_column, end_line, end_column),
            text,
            force_move_markers: None,
        },
    )
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        proptest::collection::vec(arb_typed_operation(), 1..3).prop_map(Action::Type),
        arb_position().prop_map(Action::Move),
        (0i32..3).prop_map(Action::Scroll),
        "(run|save)".prop_map(Action::Event),
        (0u64..50).prop_map(Action::Wait),
    ]
}

proptest! {
    #[test]
    fn recorded_session_replays_exactly(
        initial in "[a-z\\n]{0,12}",
        actions in proptest::collection::vec(arb_action(), 0..40),
    ) {
        let clock = ManualClock::new(1_000);
        let mut editor = MemoryEditor::new(&initial);
        let mut recorder = Recorder::with_clock(RecorderConfig::default(), clock.clone());
        recorder.start(&editor);

        // text at each committed frame boundary; the first tick may follow edits
        let mut boundaries = Vec::new();

        for action in actions {
            match action {
                Action::Type(ops) => {
                    editor.type_edits(ops);
                }
                Action::Move(position) => editor.set_cursor(position),
                Action::Scroll(top) => editor.scroll_to(top, 0),
                Action::Event(name) => recorder.add_event(name, None),
                Action::Wait(ms) => clock.advance(ms),
            }
            for change in editor.take_changes() {
                recorder.on_model_content_change(change);
            }
            if recorder.tick(&editor) {
                boundaries.push(editor.text());
            }
        }

        let excerpt = recorder.take_excerpt().unwrap();
        prop_assert_eq!(excerpt.frames.len(), boundaries.len());
        for (i, expected) in boundaries.iter().enumerate() {
            prop_assert_eq!(&linear_text(&excerpt, i + 1), expected);
        }
        prop_assert_eq!(linear_text(&excerpt, excerpt.frames.len()), editor.get_value());

        prop_assert!(excerpt.validate().is_empty(), "{:?}", excerpt.validate());
        for pair in excerpt.frames.windows(2) {
            prop_assert!(
                !(pair[1].is_idle() && pair[0].view_state == pair[1].view_state),
                "duplicate idle frame at {}", pair[1].timestamp
            );
        }
    }
}
