//! Session error types
//!
//! The moderation-conflict variants (`DuplicateSubmission`,
//! `CollidingHandle`, `BannedHandle`) are expected outcomes of the
//! submission protocol, not failures: each carries the data the caller
//! needs to issue the required mute follow-up. Only `InvalidTransition`
//! signals a caller bug or an out-of-phase command.

use crate::state::SessionState;
use thiserror::Error;
use warden_core::{Handle, SubjectId};

/// Errors from session, registry, ledger, and review operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The requested lifecycle operation is not legal in the current state.
    #[error("cannot {attempted} while session is {from}")]
    InvalidTransition {
        /// State the session was in when the operation was attempted
        from: SessionState,
        /// Name of the attempted operation
        attempted: &'static str,
    },

    /// No handle could be extracted from the submitted link text.
    #[error("submission is not a recognizable post link")]
    InvalidLinkFormat,

    /// The subject already holds a live link entry this session.
    #[error("{subject} already submitted a link this session")]
    DuplicateSubmission {
        /// The repeat submitter
        subject: SubjectId,
    },

    /// The submitted handle is currently banned.
    #[error("handle {handle} is banned")]
    BannedHandle {
        /// The banned handle
        handle: Handle,
    },

    /// Another live entry already holds the submitted handle.
    #[error("handle {handle} already submitted by {holder}")]
    CollidingHandle {
        /// The contested handle
        handle: Handle,
        /// Owner of the pre-existing entry
        holder: SubjectId,
    },

    /// A link entry, review flag, or ban record was not where the caller
    /// expected it.
    #[error("not found: {entity}")]
    NotFound {
        /// Description of the missing record
        entity: String,
    },

    /// The subject already has an active re-review flag.
    #[error("{subject} is already flagged for re-review (#{seq})")]
    AlreadyFlagged {
        /// The flagged subject
        subject: SubjectId,
        /// Sequence number of the existing flag
        seq: u64,
    },
}

impl SessionError {
    /// Create an invalid-transition error.
    pub fn invalid_transition(from: SessionState, attempted: &'static str) -> Self {
        Self::InvalidTransition { from, attempted }
    }

    /// Create a not-found error.
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::invalid_transition(SessionState::Idle, "check");
        assert!(err.to_string().contains("idle"));
        assert!(err.to_string().contains("check"));

        let err = SessionError::BannedHandle {
            handle: Handle::new("Alice"),
        };
        assert!(err.to_string().contains("alice"));

        let err = SessionError::not_found("review flag #4");
        assert!(err.to_string().contains("#4"));
    }
}
