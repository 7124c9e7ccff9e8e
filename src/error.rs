use crate::types::Revision;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by the engine, the resolver, the edit applier and the
/// store backends. Every variant is a distinct outcome; none is retried
/// internally.
#[derive(Error, Debug)]
pub enum DocError {
    #[error("document not found: {id}")]
    NotFound { id: String },

    #[error("selector did not resolve: {0}")]
    SelectorMiss(String),

    #[error("byte range [{start}, {end}) is out of bounds for text of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("revision conflict: store is at revision {current}")]
    RevisionConflict { current: Revision },

    #[error("failed to parse markdown: {0}")]
    ParseFailure(String),

    #[error("document id escapes the store root: {0}")]
    InvalidDocumentId(PathBuf),

    #[error("failed to serialize index: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocError {
    /// Optimistic-lock failure: the caller should re-read and resubmit.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DocError::RevisionConflict { .. })
    }

    /// Revision of the winning writer, if this is a conflict.
    pub fn current_revision(&self) -> Option<&Revision> {
        match self {
            DocError::RevisionConflict { current } => Some(current),
            _ => None,
        }
    }

    /// Whether resubmitting (after a fresh read) can succeed. Every other
    /// failure is a malformed request that must not be retried unmodified.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_the_only_retryable_error() {
        let conflict = DocError::RevisionConflict {
            current: Revision::new("r2"),
        };
        assert!(conflict.is_retryable());
        assert_eq!(conflict.current_revision().map(Revision::as_str), Some("r2"));

        let miss = DocError::SelectorMiss("a/b".to_string());
        assert!(!miss.is_retryable());
        assert!(miss.current_revision().is_none());
    }

    #[test]
    fn range_error_message_names_bounds() {
        let err = DocError::RangeOutOfBounds {
            start: 0,
            end: 9,
            len: 5,
        };
        assert_eq!(
            err.to_string(),
            "byte range [0, 9) is out of bounds for text of length 5"
        );
    }
}
