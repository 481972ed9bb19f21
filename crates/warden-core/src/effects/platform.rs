//! Chat-platform gateway trait
//!
//! Every outward-facing side effect the engine can request from the chat
//! platform goes through this trait: member restrictions, message
//! deletion, reminder delivery, and pin rotation. The engine treats all of
//! these as best-effort — a member who already left the group or a message
//! that was already deleted must not abort the surrounding moderation
//! action.

use crate::identifiers::{GroupId, MessageRef, SubjectId};
use crate::time::Timestamp;
use async_trait::async_trait;
use thiserror::Error;

/// Error from a single platform gateway call.
///
/// Isolated per call: the engine logs these and continues; ledger state is
/// never rolled back because a platform call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform rejected the request (permissions, rate limit, ...).
    #[error("platform rejected the call: {reason}")]
    Rejected {
        /// Platform-supplied rejection reason
        reason: String,
    },

    /// The subject is no longer a member of the group.
    #[error("{subject} is not present in {group}")]
    SubjectMissing {
        /// Group the call targeted
        group: GroupId,
        /// Missing member
        subject: SubjectId,
    },

    /// The referenced message no longer exists.
    #[error("{message} not found in {group}")]
    MessageMissing {
        /// Group the call targeted
        group: GroupId,
        /// Missing message
        message: MessageRef,
    },

    /// The gateway could not reach the platform at all.
    #[error("transport failure: {reason}")]
    Transport {
        /// Underlying transport error description
        reason: String,
    },
}

impl PlatformError {
    /// Create a rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}

/// The chat-platform capabilities consumed by the engine.
#[async_trait]
pub trait PlatformEffects: Send + Sync {
    /// Restrict a member from posting until `until`.
    async fn restrict(
        &self,
        group: GroupId,
        subject: SubjectId,
        until: Timestamp,
    ) -> Result<(), PlatformError>;

    /// Lift a member's posting restriction.
    async fn unrestrict(&self, group: GroupId, subject: SubjectId) -> Result<(), PlatformError>;

    /// Remove a member from the group.
    async fn ban_member(&self, group: GroupId, subject: SubjectId) -> Result<(), PlatformError>;

    /// Allow a previously removed member back in.
    async fn unban_member(&self, group: GroupId, subject: SubjectId) -> Result<(), PlatformError>;

    /// Delete a message from the group.
    async fn delete_message(&self, group: GroupId, message: MessageRef)
        -> Result<(), PlatformError>;

    /// Send a text message to the group, returning its reference.
    async fn send_message(&self, group: GroupId, text: &str) -> Result<MessageRef, PlatformError>;

    /// Pin a message in the group.
    async fn pin_message(&self, group: GroupId, message: MessageRef) -> Result<(), PlatformError>;

    /// Unpin a previously pinned message.
    async fn unpin_message(&self, group: GroupId, message: MessageRef)
        -> Result<(), PlatformError>;

    /// Whether the subject is an administrator of the group.
    async fn is_admin(&self, group: GroupId, subject: SubjectId) -> Result<bool, PlatformError>;
}
