//! Snapshot persistence trait
//!
//! Each group's full engine state serializes to a single document keyed by
//! group id. The store holds opaque bytes; the schema and its
//! serialization live with the domain layer so this trait never needs to
//! change when the snapshot grows a field.

use crate::identifiers::GroupId;
use async_trait::async_trait;
use thiserror::Error;

/// Error from the snapshot store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached or returned a failure.
    #[error("snapshot backend failure: {reason}")]
    Backend {
        /// Backend-supplied error description
        reason: String,
    },

    /// The stored document could not be decoded.
    #[error("corrupt snapshot for {group}: {reason}")]
    Corrupt {
        /// Group whose document failed to decode
        group: GroupId,
        /// Decode error description
        reason: String,
    },
}

impl StoreError {
    /// Create a backend error.
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }

    /// Create a corrupt-document error.
    pub fn corrupt(group: GroupId, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            group,
            reason: reason.into(),
        }
    }
}

/// Document storage for per-group engine snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot document for a group, if one exists.
    async fn load(&self, group: GroupId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Persist the snapshot document for a group, replacing any prior one.
    async fn save(&self, group: GroupId, document: &[u8]) -> Result<(), StoreError>;
}
