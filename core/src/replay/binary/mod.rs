//! Binary excerpt format (.mrp)
//!
//! Every record is a sequence of numbered fields. Each field starts with a
//! varint key `(number << 3) | wire_type`, followed by its payload:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ wire 0 (varint)   unsigned ints, bools       │
//! │                   signed ints (zigzag)       │
//! │ wire 2 (length)   varint len + bytes         │
//! │                   strings, nested records    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Repeated fields repeat the key once per element, in order. Optional fields
//! are simply omitted. Unknown field numbers are skipped on read, so fields
//! can be added without breaking older readers. There is no header or magic
//! number; the file is the encoded `Excerpt` record.
//!
//! Field numbers are fixed once assigned (see [`field`]).

mod error;
mod reader;
mod writer;

use std::fs;
use std::io;
use std::path::Path;

pub use error::MalformedRecordError;
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

use super::types::{EditorViewState, Excerpt};

/// Conventional file extension for encoded excerpts
pub const FILE_EXTENSION: &str = "mrp";

/// Wire types understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Len = 2,
    Fixed32 = 5,
}

impl WireType {
    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::Len),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// Field numbers per record
pub mod field {
    pub mod position {
        pub const LINE: u32 = 1;
        pub const COLUMN: u32 = 2;
    }

    pub mod range {
        pub const START_LINE: u32 = 1;
        pub const START_COLUMN: u32 = 2;
        pub const END_LINE: u32 = 3;
        pub const END_COLUMN: u32 = 4;
    }

    pub mod view_state {
        pub const SCROLL_TOP: u32 = 1;
        pub const SCROLL_TOP_WITHOUT_VIEW_ZONES: u32 = 2;
        pub const SCROLL_LEFT: u32 = 3;
        pub const FIRST_POSITION: u32 = 4;
        pub const FIRST_POSITION_DELTA_TOP: u32 = 5;
    }

    pub mod cursor_state {
        pub const IN_SELECTION_MODE: u32 = 1;
        pub const SELECTION_START: u32 = 2;
        pub const POSITION: u32 = 3;
    }

    pub mod editor_view_state {
        pub const CURSOR_STATE: u32 = 1;
        pub const VIEW_STATE: u32 = 2;
    }

    pub mod operation {
        pub const RANGE: u32 = 1;
        pub const TEXT: u32 = 2;
        pub const FORCE_MOVE_MARKERS: u32 = 3;
    }

    pub mod event {
        pub const NAME: u32 = 1;
        pub const TIMESTAMP: u32 = 2;
        pub const PAYLOAD: u32 = 3;
    }

    pub mod frame {
        pub const OPERATIONS: u32 = 1;
        pub const VIEW_STATE: u32 = 2;
        pub const TIMESTAMP: u32 = 3;
        pub const VALUE: u32 = 4;
        pub const EVENTS: u32 = 5;
    }

    pub mod excerpt {
        pub const VALUE: u32 = 1;
        pub const FRAMES: u32 = 2;
        pub const TIMESTAMP: u32 = 3;
    }
}

pub(crate) fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub(crate) fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Encode an excerpt to bytes
pub fn encode(excerpt: &Excerpt) -> Vec<u8> {
    writer::encode_excerpt(excerpt)
}

/// Decode an excerpt from bytes
pub fn decode(bytes: &[u8]) -> Result<Excerpt, MalformedRecordError> {
    BinaryReader::new(bytes).read_excerpt()
}

/// Encode only the view state; the recorder compares these bytes for dedup
pub fn encode_view_state(state: &EditorViewState) -> Vec<u8> {
    writer::encode_editor_view_state(state)
}

/// Read and decode an `.mrp` file
pub fn read_excerpt_file(path: &Path) -> io::Result<Excerpt> {
    let bytes = fs::read(path)?;
    decode(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Encode and write an `.mrp` file
pub fn write_excerpt_file(path: &Path, excerpt: &Excerpt) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BinaryWriter::new(io::BufWriter::new(file));
    writer.write_excerpt(excerpt)?;
    writer.flush()
}
