//! Error types for raquad operations.

use thiserror::Error;

/// Errors raised by tree construction and snapshot I/O.
///
/// Out-of-domain points and minimum-cell collisions are not errors;
/// `insert` reports them through its `bool` return.
#[derive(Error, Debug)]
pub enum RaquadError {
    /// I/O error during snapshot read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot record that cannot be parsed.
    #[error("invalid snapshot record at line {line}: {reason}")]
    InvalidFormat { line: u64, reason: String },

    /// The snapshot stream ended before the tree structure was complete.
    #[error("unexpected end of snapshot stream")]
    UnexpectedEof,

    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A snapshot whose per-node error vectors do not fit the reading
    /// tree's objective and `max_zoom`.
    #[error("snapshot error vector has length {found}, tree expects {expected}")]
    ObjectiveMismatch { expected: usize, found: usize },
}

/// Result type for raquad operations.
pub type Result<T> = std::result::Result<T, RaquadError>;
