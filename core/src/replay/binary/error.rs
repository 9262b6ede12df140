//! Decode failures

/// A record could not be decoded. No partial excerpt is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecordError {
    #[error("{record}: input ends inside a field")]
    Truncated { record: &'static str },

    #[error("{record}: varint longer than 10 bytes")]
    VarintOverflow { record: &'static str },

    #[error("{record}: field number 0 is reserved")]
    ReservedField { record: &'static str },

    #[error("{record}: unsupported wire type {wire_type}")]
    UnsupportedWireType { record: &'static str, wire_type: u8 },

    #[error("{record}: field {field} has wire type {found}, expected {expected}")]
    WireTypeMismatch {
        record: &'static str,
        field: u32,
        found: u8,
        expected: u8,
    },

    #[error("{record}: missing required field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record}: field {field} is not valid UTF-8")]
    InvalidUtf8 { record: &'static str, field: u32 },

    #[error("{record}: field {field} value {value} does not fit")]
    OutOfRange {
        record: &'static str,
        field: u32,
        value: i128,
    },
}
