use thiserror::Error;

/// Core error type shared across fauxdata crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be represented as the requested type.
    #[error("cannot convert {value} to {target}: {reason}")]
    Conversion {
        value: String,
        target: String,
        reason: String,
    },
    /// A referenced column is not present in the buffer.
    #[error("column '{0}' not found")]
    UnknownColumn(String),
    /// A column does not match the buffer height.
    #[error("column '{name}' has {actual} rows but the buffer has {expected}")]
    Length {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// Unknown data type tag.
    #[error("unknown data type '{0}'")]
    UnknownDataType(String),
    /// Unknown sub-second precision unit.
    #[error("unknown time unit '{0}'")]
    UnknownTimeUnit(String),
    /// Offset expression could not be parsed.
    #[error("invalid offset '{0}'")]
    InvalidOffset(String),
}

/// Convenience alias for results returned by fauxdata crates.
pub type Result<T> = std::result::Result<T, Error>;
