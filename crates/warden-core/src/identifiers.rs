//! Core identifier types used across the warden engine
//!
//! Chat platforms address groups, members, and messages with signed integer
//! ids, while external identities arrive as handle strings extracted from
//! submitted post links. Each gets its own newtype so the id spaces cannot
//! be mixed up at a call site.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat group identifier.
///
/// Every session, ledger entry, and timer in the engine is keyed by the
/// group it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub i64);

impl GroupId {
    /// Create from a raw platform chat id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner platform id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

impl From<i64> for GroupId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Chat member identifier (the platform's user id).
///
/// Distinct from [`Handle`]: a subject is who posted in the group, a handle
/// is the external account their submitted link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub i64);

impl SubjectId {
    /// Create from a raw platform user id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner platform id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject-{}", self.0)
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Reference to a message previously sent in a group.
///
/// Used for deleting violating submissions and rotating pinned reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageRef(pub i64);

impl MessageRef {
    /// Create from a raw platform message id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner platform id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

impl From<i64> for MessageRef {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Normalized external identity extracted from a submitted post link.
///
/// Handles are stored lowercased and trimmed so ban-ledger lookups are
/// case-insensitive regardless of how the link was typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    /// Normalize a raw handle string.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    /// The normalized handle text, without any `@` prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Handle {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
