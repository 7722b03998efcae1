//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed input reaching the model boundary.
///
/// The tree operations themselves never fail: unknown ids degrade to
/// identity transforms. These errors only surface while turning text
/// (node ids, event lines) into domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid node id: {0:?} (expected `root` or `n<number>`)")]
    InvalidNodeId(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("invalid event on line {line}: {message}")]
    InvalidEvent { line: usize, message: String },
}

/// Result type for domain parsing.
pub type DomainResult<T> = Result<T, DomainError>;
