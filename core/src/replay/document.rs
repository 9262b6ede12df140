//! Plain-text document buffer
//!
//! Applies [`EditOperation`]s the way the host editor does: 1-based line and
//! column coordinates, clamped into the document, applied one after another.
//! Used as the scratch model of the playback cache and as the text store of
//! [`MemoryEditor`](crate::replay::MemoryEditor).

use ropey::Rope;

use super::types::{EditOperation, Position, Range};

/// Rope-backed text buffer. Only `\n` ends a line; a preceding `\r` is
/// part of the terminator, never a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    rope: Rope,
}

impl From<Rope> for Document {
    fn from(rope: Rope) -> Self {
        Self { rope }
    }
}

impl Document {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    pub fn line_count(&self) -> u32 {
        self.rope.len_lines() as u32
    }

    /// Number of columns on a 1-based line (chars, not bytes)
    pub fn line_length(&self, line: u32) -> u32 {
        match (line as usize).checked_sub(1) {
            Some(index) if index < self.rope.len_lines() => {
                let (start, end) = self.content_span(index);
                (end - start) as u32
            }
            _ => 0,
        }
    }

    /// Clamp a position into the document
    pub fn validate_position(&self, position: Position) -> Position {
        let line = position.line.clamp(1, self.line_count());
        let column = position.column.clamp(1, self.line_length(line) + 1);
        Position::new(line, column)
    }

    /// Position of a char index. Indices inside a line terminator map to the end of that line.
    pub fn position_at(&self, char_idx: usize) -> Position {
        let char_idx = char_idx.min(self.rope.len_chars());
        let index = self.rope.char_to_line(char_idx);
        let (start, end) = self.content_span(index);
        let column = char_idx.clamp(start, end) - start + 1;
        Position::new(index as u32 + 1, column as u32)
    }

    /// Apply one operation. Returns the range now covered by the inserted text.
    pub fn apply(&mut self, operation: &EditOperation) -> Range {
        let a = self.char_index(operation.range.start());
        let b = self.char_index(operation.range.end());
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let insert = operation.text.as_deref().unwrap_or("");

        self.rope.remove(start..end);
        self.rope.insert(start, insert);

        let from = self.position_at(start);
        let to = self.position_at(start + insert.chars().count());
        Range::new(from.line, from.column, to.line, to.column)
    }

    /// Apply operations in order, each against the result of the previous one
    pub fn apply_all<'a>(&mut self, operations: impl IntoIterator<Item = &'a EditOperation>) {
        for operation in operations {
            self.apply(operation);
        }
    }

    // Char index of a (clamped) position
    fn char_index(&self, position: Position) -> usize {
        let position = self.validate_position(position);
        self.rope.line_to_char((position.line - 1) as usize) + (position.column - 1) as usize
    }

    // Char span of a line's content, excluding `\n` or `\r\n`
    fn content_span(&self, index: usize) -> (usize, usize) {
        let start = self.rope.line_to_char(index);
        if index + 1 >= self.rope.len_lines() {
            return (start, self.rope.len_chars());
        }
        let newline = self.rope.line_to_char(index + 1) - 1;
        if newline > start && self.rope.char(newline - 1) == '\r' {
            (start, newline - 1)
        } else {
            (start, newline)
        }
    }
}

/// Replay operations on top of `initial` and return the final text
pub fn replay_text<'a>(
    initial: &str,
    operations: impl IntoIterator<Item = &'a EditOperation>,
) -> String {
    let mut document = Document::new(initial);
    document.apply_all(operations);
    document.text()
}
