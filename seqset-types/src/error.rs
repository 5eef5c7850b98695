use thiserror::Error;

/// Errors raised while constructing time, value or box types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("A {0} must contain at least one element")]
    EmptySet(&'static str),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown value kind tag: {0}")]
    UnknownKindTag(u8),
}
