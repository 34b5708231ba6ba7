use std::fmt;

/// Failure decoding a packed command or sub-state buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    ShortBuffer { actual: usize, expected: usize },
    ReservedNonZero { offset: usize },
    FieldOutOfRange { field: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortBuffer { actual, expected } => {
                write!(f, "buffer too short: {actual} bytes, expected {expected}")
            }
            Self::ReservedNonZero { offset } => {
                write!(f, "reserved byte at offset {offset} is non-zero")
            }
            Self::FieldOutOfRange { field } => write!(f, "field out of range: {field}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Internal-consistency conditions checked by debug assertions during
/// planning. Release builds handle every one of these by rollback or by
/// disabling the offending strategy instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationCode {
    StackCacheParity,
    RestoreMismatch,
    SuggestionCycle,
    FrameDurationQuantum,
    StackOverflow,
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackCacheParity => write!(f, "STACK_CACHE_PARITY"),
            Self::RestoreMismatch => write!(f, "RESTORE_MISMATCH"),
            Self::SuggestionCycle => write!(f, "SUGGESTION_CYCLE"),
            Self::FrameDurationQuantum => write!(f, "FRAME_DURATION_QUANTUM"),
            Self::StackOverflow => write!(f, "STACK_OVERFLOW"),
        }
    }
}
