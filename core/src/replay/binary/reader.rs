//! Binary excerpt format reader
//!
//! Reads .mrp bytes. Required fields are checked once the whole record has
//! been consumed; unknown fields are skipped.

use super::{MalformedRecordError, WireType, field, zigzag_decode};
use crate::replay::types::*;

type Result<T> = std::result::Result<T, MalformedRecordError>;

/// Record names used in error reports
mod record {
    pub const POSITION: &str = "Position";
    pub const RANGE: &str = "Range";
    pub const VIEW_STATE: &str = "ViewState";
    pub const CURSOR_STATE: &str = "CursorState";
    pub const EDITOR_VIEW_STATE: &str = "EditorViewState";
    pub const OPERATION: &str = "EditOperation";
    pub const EVENT: &str = "CustomEvent";
    pub const FRAME: &str = "Frame";
    pub const EXCERPT: &str = "Excerpt";
}

/// Reader for binary excerpt format
pub struct BinaryReader<'a> {
    buf: &'a [u8],
    pos: usize,
    record: &'static str,
}

impl<'a> BinaryReader<'a> {
    /// Create a new binary reader over a complete buffer
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            record: record::EXCERPT,
        }
    }

    fn nested(buf: &'a [u8], record: &'static str) -> Self {
        Self { buf, pos: 0, record }
    }

    /// Read a complete excerpt from the input
    pub fn read_excerpt(&mut self) -> Result<Excerpt> {
        use field::excerpt::*;
        self.record = record::EXCERPT;

        let mut value = None;
        let mut frames = Vec::new();
        let mut timestamp = None;

        while let Some((number, wire)) = self.next_key()? {
            match number {
                VALUE => value = Some(self.string(number, wire)?),
                FRAMES => {
                    let body = self.message(number, wire)?;
                    frames.push(Self::nested(body, record::FRAME).read_frame()?);
                }
                TIMESTAMP => timestamp = Some(self.uint(number, wire)?),
                _ => self.skip(wire)?,
            }
        }

        Ok(Excerpt {
            value: self.required(value, "value")?,
            frames,
            timestamp: self.required(timestamp, "timestamp")?,
        })
    }

    fn read_frame(&mut self) -> Result<Frame> {
        use field::frame::*;
        let mut frame = Frame::default();

        while let Some((number, wire)) = self.next_key()? {
            match number {
                OPERATIONS => {
                    let body = self.message(number, wire)?;
                    frame
                        .operations
                        .push(Self::nested(body, record::OPERATION).read_operation()?);
                }
                VIEW_STATE => {
                    let body = self.message(number, wire)?;
                    frame.view_state =
                        Self::nested(body, record::EDITOR_VIEW_STATE).read_editor_view_state()?;
                }
                TIMESTAMP => frame.timestamp = self.uint(number, wire)?,
                VALUE => frame.value = Some(self.string(number, wire)?),
                EVENTS => {
                    let body = self.message(number, wire)?;
                    frame.events.push(Self::nested(body, record::EVENT).read_event()?);
                }
                _ => self.skip(wire)?,
            }
        }

        Ok(frame)
    }

    fn read_operation(&mut self) -> Result<EditOperation> {
        use field::operation::*;
        let mut range = None;
        let mut text = None;
        let mut force_move_markers = None;

        while let Some((number, wire)) = self.next_key()? {
            match number {
                RANGE => {
                    let body = self.message(number, wire)?;
                    range = Some(Self::nested(body, record::RANGE).read_range()?);
                }
                TEXT => text = Some(self.string(number, wire)?),
                FORCE_MOVE_MARKERS => force_move_markers = Some(self.bool(number, wire)?),
                _ => self.skip(wire)?,
            }
        }

        Ok(EditOperation {
            range: self.required(range, "range")?,
            text,
            force_move_markers,
        })
    }

    fn read_event(&mut self) -> Result<CustomEvent> {
        use field::event::*;
        let mut event = CustomEvent {
            name: String::new(),
            timestamp: 0,
            payload: None,
        };

        while let Some((number, wire)) = self.next_key()? {
            match number {
                NAME => event.name = self.string(number, wire)?,
                TIMESTAMP => event.timestamp = self.uint(number, wire)?,
                PAYLOAD => event.payload = Some(self.string(number, wire)?),
                _ => self.skip(wire)?,
            }
        }

        Ok(event)
    }

    fn read_editor_view_state(&mut self) -> Result<EditorViewState> {
        use field::editor_view_state::*;
        let mut state = EditorViewState::default();

        while let Some((number, wire)) = self.next_key()? {
            match number {
                CURSOR_STATE => {
                    let body = self.message(number, wire)?;
                    state
                        .cursor_state
                        .push(Self::nested(body, record::CURSOR_STATE).read_cursor_state()?);
                }
                VIEW_STATE => {
                    let body = self.message(number, wire)?;
                    state.view_state = Self::nested(body, record::VIEW_STATE).read_view_state()?;
                }
                _ => self.skip(wire)?,
            }
        }

        Ok(state)
    }

    fn read_cursor_state(&mut self) -> Result<CursorState> {
        use field::cursor_state::*;
        let mut cursor = CursorState {
            in_selection_mode: false,
            selection_start: Position::new(0, 0),
            position: Position::new(0, 0),
        };

        while let Some((number, wire)) = self.next_key()? {
            match number {
                IN_SELECTION_MODE => cursor.in_selection_mode = self.bool(number, wire)?,
                SELECTION_START => {
                    let body = self.message(number, wire)?;
                    cursor.selection_start = Self::nested(body, record::POSITION).read_position()?;
                }
                POSITION => {
                    let body = self.message(number, wire)?;
                    cursor.position = Self::nested(body, record::POSITION).read_position()?;
                }
                _ => self.skip(wire)?,
            }
        }

        Ok(cursor)
    }

    fn read_view_state(&mut self) -> Result<ViewState> {
        use field::view_state::*;
        let mut state = ViewState {
            first_position: Position::new(0, 0),
            ..Default::default()
        };

        while let Some((number, wire)) = self.next_key()? {
            match number {
                SCROLL_TOP => state.scroll_top = Some(self.i32(number, wire)?),
                SCROLL_TOP_WITHOUT_VIEW_ZONES => {
                    state.scroll_top_without_view_zones = Some(self.i32(number, wire)?)
                }
                SCROLL_LEFT => state.scroll_left = self.i32(number, wire)?,
                FIRST_POSITION => {
                    let body = self.message(number, wire)?;
                    state.first_position = Self::nested(body, record::POSITION).read_position()?;
                }
                FIRST_POSITION_DELTA_TOP => state.first_position_delta_top = self.i32(number, wire)?,
                _ => self.skip(wire)?,
            }
        }

        Ok(state)
    }

    fn read_range(&mut self) -> Result<Range> {
        use field::range::*;
        let mut range = Range::new(0, 0, 0, 0);

        while let Some((number, wire)) = self.next_key()? {
            match number {
                START_LINE => range.start_line = self.u32(number, wire)?,
                START_COLUMN => range.start_column = self.u32(number, wire)?,
                END_LINE => range.end_line = self.u32(number, wire)?,
                END_COLUMN => range.end_column = self.u32(number, wire)?,
                _ => self.skip(wire)?,
            }
        }

        Ok(range)
    }

    fn read_position(&mut self) -> Result<Position> {
        use field::position::*;
        let mut position = Position::new(0, 0);

        while let Some((number, wire)) = self.next_key()? {
            match number {
                LINE => position.line = self.u32(number, wire)?,
                COLUMN => position.column = self.u32(number, wire)?,
                _ => self.skip(wire)?,
            }
        }

        Ok(position)
    }

    // Primitive reads

    fn truncated(&self) -> MalformedRecordError {
        MalformedRecordError::Truncated {
            record: self.record,
        }
    }

    fn required<T>(&self, value: Option<T>, name: &'static str) -> Result<T> {
        value.ok_or(MalformedRecordError::MissingField {
            record: self.record,
            field: name,
        })
    }

    fn varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..70).step_by(7) {
            let byte = *self.buf.get(self.pos).ok_or_else(|| self.truncated())?;
            self.pos += 1;

            if shift == 63 && byte > 1 {
                return Err(MalformedRecordError::VarintOverflow {
                    record: self.record,
                });
            }
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(MalformedRecordError::VarintOverflow {
            record: self.record,
        })
    }

    fn next_key(&mut self) -> Result<Option<(u32, WireType)>> {
        if self.pos >= self.buf.len() {
            return Ok(None);
        }

        let key = self.varint()?;
        let bits = (key & 0x07) as u8;
        let number = key >> 3;

        if number == 0 {
            return Err(MalformedRecordError::ReservedField {
                record: self.record,
            });
        }
        let number = u32::try_from(number).map_err(|_| MalformedRecordError::OutOfRange {
            record: self.record,
            field: 0,
            value: number as i128,
        })?;
        let wire = WireType::from_bits(bits).ok_or(MalformedRecordError::UnsupportedWireType {
            record: self.record,
            wire_type: bits,
        })?;

        Ok(Some((number, wire)))
    }

    fn expect(&self, number: u32, found: WireType, expected: WireType) -> Result<()> {
        if found != expected {
            return Err(MalformedRecordError::WireTypeMismatch {
                record: self.record,
                field: number,
                found: found as u8,
                expected: expected as u8,
            });
        }
        Ok(())
    }

    fn uint(&mut self, number: u32, wire: WireType) -> Result<u64> {
        self.expect(number, wire, WireType::Varint)?;
        self.varint()
    }

    fn u32(&mut self, number: u32, wire: WireType) -> Result<u32> {
        let value = self.uint(number, wire)?;
        u32::try_from(value).map_err(|_| MalformedRecordError::OutOfRange {
            record: self.record,
            field: number,
            value: value as i128,
        })
    }

    fn i32(&mut self, number: u32, wire: WireType) -> Result<i32> {
        let value = zigzag_decode(self.uint(number, wire)?);
        i32::try_from(value).map_err(|_| MalformedRecordError::OutOfRange {
            record: self.record,
            field: number,
            value: value as i128,
        })
    }

    fn bool(&mut self, number: u32, wire: WireType) -> Result<bool> {
        match self.uint(number, wire)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MalformedRecordError::OutOfRange {
                record: self.record,
                field: number,
                value: other as i128,
            }),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| self.truncated())?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn length_delimited(&mut self) -> Result<&'a [u8]> {
        let len = self.varint()?;
        let len = usize::try_from(len).map_err(|_| self.truncated())?;
        self.take(len)
    }

    fn message(&mut self, number: u32, wire: WireType) -> Result<&'a [u8]> {
        self.expect(number, wire, WireType::Len)?;
        self.length_delimited()
    }

    fn string(&mut self, number: u32, wire: WireType) -> Result<String> {
        let bytes = self.message(number, wire)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| MalformedRecordError::InvalidUtf8 {
            record: self.record,
            field: number,
        })
    }

    fn skip(&mut self, wire: WireType) -> Result<()> {
        match wire {
            WireType::Varint => {
                self.varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
            WireType::Len => {
                self.length_delimited()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::binary::{decode, encode};

    #[test]
    fn test_missing_excerpt_value() {
        // only timestamp (field 3, varint) = 7
        let err = decode(&[0x18, 0x07]).unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError::MissingField {
                record: "Excerpt",
                field: "value",
            }
        );
    }

    #[test]
    fn test_missing_excerpt_timestamp() {
        let err = decode(&[0x0A, 0x01, b'a']).unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError::MissingField {
                record: "Excerpt",
                field: "timestamp",
            }
        );
    }

    #[test]
    fn test_operation_without_range() {
        // frame { operation { text: "x" } }
        let operation = [0x12, 0x01, b'x'];
        let mut frame = vec![0x0A, operation.len() as u8];
        frame.extend_from_slice(&operation);
        let mut bytes = vec![0x0A, 0x00, 0x12, frame.len() as u8];
        bytes.extend_from_slice(&frame);
        bytes.extend_from_slice(&[0x18, 0x00]);

        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError::MissingField {
                record: "EditOperation",
                field: "range",
            }
        );
    }

    #[test]
    fn test_wire_type_collision() {
        // value (field 1) sent as a varint
        let err = decode(&[0x08, 0x01, 0x18, 0x00]).unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError::WireTypeMismatch {
                record: "Excerpt",
                field: 1,
                found: 0,
                expected: 2,
            }
        );
    }

    #[test]
    fn test_truncated_string() {
        let err = decode(&[0x0A, 0x05, b'a', b'b']).unwrap_err();
        assert_eq!(err, MalformedRecordError::Truncated { record: "Excerpt" });
    }

    #[test]
    fn test_group_wire_type_rejected() {
        let err = decode(&[0x0B]).unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError::UnsupportedWireType {
                record: "Excerpt",
                wire_type: 3,
            }
        );
    }

    #[test]
    fn test_varint_overflow() {
        let mut bytes = vec![0x18];
        bytes.extend_from_slice(&[0xFF; 10]);
        bytes.push(0x01);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, MalformedRecordError::VarintOverflow { record: "Excerpt" });
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let excerpt = Excerpt::new("abc", 42);
        let mut bytes = encode(&excerpt);
        // field 9 varint, field 10 length-delimited, field 11 fixed32, field 12 fixed64
        bytes.extend_from_slice(&[0x48, 0x96, 0x01]);
        bytes.extend_from_slice(&[0x52, 0x02, 0xAA, 0xBB]);
        bytes.extend_from_slice(&[0x5D, 1, 2, 3, 4]);
        bytes.extend_from_slice(&[0x61, 1, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(decode(&bytes).unwrap(), excerpt);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = decode(&[0x0A, 0x02, 0xC3, 0x28, 0x18, 0x00]).unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError::InvalidUtf8 {
                record: "Excerpt",
                field: 1,
            }
        );
    }

    #[test]
    fn test_line_out_of_range() {
        // position { line: 2^32 }
        let mut reader = BinaryReader::nested(&[0x08, 0x80, 0x80, 0x80, 0x80, 0x10], record::POSITION);
        let err = reader.read_position().unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError::OutOfRange {
                record: "Position",
                field: 1,
                value: 1 << 32,
            }
        );
    }
}
