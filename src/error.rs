//! Error types for sequence-set construction, codecs and operators.
//!
//! Empty results are never errors: restrictions return `Ok(None)` and the
//! algebra returns `Intersection::Disjoint`.

use seqset_types::{TimestampTz, TypeError, ValueKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeqSetError>;

#[derive(Debug, Error)]
pub enum SeqSetError {
    /// Two consecutive instants or sequences are out of order or cover the
    /// same instant twice.
    #[error("Broken ordering: {prev} is not before {next}")]
    BrokenOrdering {
        prev: TimestampTz,
        next: TimestampTz,
    },

    /// Two inputs cover the same instant with different values.
    #[error("Conflicting values at {at}")]
    ConflictingValues { at: TimestampTz },

    #[error("Mixed geometry: {0}")]
    MixedGeometry(String),

    #[error("Value kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Input mixes stepwise and linear interpolation")]
    MixedInterpolation,

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("Corrupt layout: {0}")]
    CorruptLayout(String),

    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation {op} is not supported for {kind} values")]
    Unsupported { op: &'static str, kind: ValueKind },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeqSetError {
    pub(crate) fn unsupported(op: &'static str, kind: ValueKind) -> Self {
        SeqSetError::Unsupported { op, kind }
    }
}
