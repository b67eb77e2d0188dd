use git2::Oid;
use thiserror::Error;

use crate::range::Range;

pub type Result<T> = std::result::Result<T, ContextError>;

/// Failures reported by a revision store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("revision {0} not found")]
    RevisionNotFound(Oid),

    #[error("object {0} not found")]
    ObjectNotFound(Oid),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

/// Failures that abort a whole context batch.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The anchor of a comment does not fit the content it points into.
    #[error("invalid comment range {range}: text only contains {line_count} lines")]
    InvalidRange { range: Range, line_count: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
