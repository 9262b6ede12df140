//! Binary excerpt format writer
//!
//! Writes .mrp files. Nested records are encoded into scratch buffers first
//! so their length prefix is known.

use super::{WireType, field, zigzag_encode};
use crate::replay::types::*;
use std::io::{self, Write};

/// Writer for binary excerpt format
pub struct BinaryWriter<W: Write> {
    writer: W,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a complete excerpt to the output
    pub fn write_excerpt(&mut self, excerpt: &Excerpt) -> io::Result<()> {
        self.writer.write_all(&encode_excerpt(excerpt))
    }

    /// Write a single frame record (without the excerpt envelope)
    pub fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        let mut enc = Encoder::default();
        put_frame(&mut enc, frame);
        self.writer.write_all(&enc.buf)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[derive(Default)]
struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    fn key(&mut self, number: u32, wire: WireType) {
        self.varint(((number as u64) << 3) | wire as u64);
    }

    fn uint(&mut self, number: u32, value: u64) {
        self.key(number, WireType::Varint);
        self.varint(value);
    }

    fn sint(&mut self, number: u32, value: i64) {
        self.uint(number, zigzag_encode(value));
    }

    fn bool(&mut self, number: u32, value: bool) {
        self.uint(number, value as u64);
    }

    fn bytes(&mut self, number: u32, bytes: &[u8]) {
        self.key(number, WireType::Len);
        self.varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    fn string(&mut self, number: u32, value: &str) {
        self.bytes(number, value.as_bytes());
    }

    fn message(&mut self, number: u32, body: impl FnOnce(&mut Encoder)) {
        let mut nested = Encoder::default();
        body(&mut nested);
        self.bytes(number, &nested.buf);
    }
}

fn put_position(enc: &mut Encoder, position: &Position) {
    use field::position::*;
    enc.uint(LINE, position.line as u64);
    enc.uint(COLUMN, position.column as u64);
}

fn put_range(enc: &mut Encoder, range: &Range) {
    use field::range::*;
    enc.uint(START_LINE, range.start_line as u64);
    enc.uint(START_COLUMN, range.start_column as u64);
    enc.uint(END_LINE, range.end_line as u64);
    enc.uint(END_COLUMN, range.end_column as u64);
}

fn put_view_state(enc: &mut Encoder, state: &ViewState) {
    use field::view_state::*;
    if let Some(top) = state.scroll_top {
        enc.sint(SCROLL_TOP, top as i64);
    }
    if let Some(top) = state.scroll_top_without_view_zones {
        enc.sint(SCROLL_TOP_WITHOUT_VIEW_ZONES, top as i64);
    }
    enc.sint(SCROLL_LEFT, state.scroll_left as i64);
    enc.message(FIRST_POSITION, |e| put_position(e, &state.first_position));
    enc.sint(FIRST_POSITION_DELTA_TOP, state.first_position_delta_top as i64);
}

fn put_cursor_state(enc: &mut Encoder, cursor: &CursorState) {
    use field::cursor_state::*;
    enc.bool(IN_SELECTION_MODE, cursor.in_selection_mode);
    enc.message(SELECTION_START, |e| put_position(e, &cursor.selection_start));
    enc.message(POSITION, |e| put_position(e, &cursor.position));
}

fn put_editor_view_state(enc: &mut Encoder, state: &EditorViewState) {
    use field::editor_view_state::*;
    for cursor in &state.cursor_state {
        enc.message(CURSOR_STATE, |e| put_cursor_state(e, cursor));
    }
    enc.message(VIEW_STATE, |e| put_view_state(e, &state.view_state));
}

fn put_operation(enc: &mut Encoder, operation: &EditOperation) {
    use field::operation::*;
    enc.message(RANGE, |e| put_range(e, &operation.range));
    if let Some(text) = &operation.text {
        enc.string(TEXT, text);
    }
    if let Some(force) = operation.force_move_markers {
        enc.bool(FORCE_MOVE_MARKERS, force);
    }
}

fn put_event(enc: &mut Encoder, event: &CustomEvent) {
    use field::event::*;
    enc.string(NAME, &event.name);
    enc.uint(TIMESTAMP, event.timestamp);
    if let Some(payload) = &event.payload {
        enc.string(PAYLOAD, payload);
    }
}

fn put_frame(enc: &mut Encoder, frame: &Frame) {
    use field::frame::*;
    for operation in &frame.operations {
        enc.message(OPERATIONS, |e| put_operation(e, operation));
    }
    enc.message(VIEW_STATE, |e| put_editor_view_state(e, &frame.view_state));
    enc.uint(TIMESTAMP, frame.timestamp);
    if let Some(value) = &frame.value {
        enc.string(VALUE, value);
    }
    for event in &frame.events {
        enc.message(EVENTS, |e| put_event(e, event));
    }
}

pub(super) fn encode_excerpt(excerpt: &Excerpt) -> Vec<u8> {
    use field::excerpt::*;
    let mut enc = Encoder::default();
    enc.string(VALUE, &excerpt.value);
    for frame in &excerpt.frames {
        enc.message(FRAMES, |e| put_frame(e, frame));
    }
    enc.uint(TIMESTAMP, excerpt.timestamp);
    enc.buf
}

pub(super) fn encode_editor_view_state(state: &EditorViewState) -> Vec<u8> {
    let mut enc = Encoder::default();
    put_editor_view_state(&mut enc, state);
    enc.buf
}
