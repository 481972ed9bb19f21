//! Per-session link registry
//!
//! Holds the live link entries for one open/close cycle: exactly one entry
//! per owner, and no two live entries sharing an external handle. The
//! registry validates submissions against itself and the ban ledger;
//! removing entries and issuing mutes on violation is the caller's part of
//! the protocol.

use crate::error::SessionError;
use crate::handle::extract_handle;
use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use warden_core::{Handle, MessageRef, SubjectId, Timestamp};

/// A live link submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Group member who submitted the link
    pub owner: SubjectId,
    /// External account the link points at
    pub handle: Handle,
    /// The submitted text, verbatim
    pub raw_link: String,
    /// Submission time
    pub submitted_at: Timestamp,
    /// The submission message, for later deletion
    pub origin: Option<MessageRef>,
}

/// Live link entries for one session cycle, keyed by owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRegistry {
    entries: BTreeMap<SubjectId, LinkEntry>,
}

impl LinkRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a submission and create its entry.
    ///
    /// Checks run in protocol order: extractable handle, one entry per
    /// owner, handle not banned, handle not already live. Each conflict
    /// returns without mutating the registry; the caller applies the
    /// mutes and removals the conflict calls for.
    pub fn submit(
        &mut self,
        ledger: &mut Ledger,
        owner: SubjectId,
        text: &str,
        origin: Option<MessageRef>,
        now: Timestamp,
    ) -> Result<&LinkEntry, SessionError> {
        let handle = extract_handle(text).ok_or(SessionError::InvalidLinkFormat)?;

        if self.entries.contains_key(&owner) {
            return Err(SessionError::DuplicateSubmission { subject: owner });
        }

        if ledger.is_handle_banned(&handle, now) {
            return Err(SessionError::BannedHandle { handle });
        }

        if let Some(existing) = self.lookup_by_handle(&handle) {
            return Err(SessionError::CollidingHandle {
                handle,
                holder: existing.owner,
            });
        }

        let entry = LinkEntry {
            owner,
            handle,
            raw_link: text.to_string(),
            submitted_at: now,
            origin,
        };
        Ok(self.entries.entry(owner).or_insert(entry))
    }

    /// Re-insert an entry from a snapshot, bypassing validation.
    pub(crate) fn restore(&mut self, entry: LinkEntry) {
        self.entries.insert(entry.owner, entry);
    }

    /// Remove and return the owner's entry, if present.
    pub fn remove(&mut self, owner: SubjectId) -> Option<LinkEntry> {
        self.entries.remove(&owner)
    }

    /// The owner's live entry, if any.
    pub fn lookup(&self, owner: SubjectId) -> Option<&LinkEntry> {
        self.entries.get(&owner)
    }

    /// The live entry holding `handle`, if any.
    pub fn lookup_by_handle(&self, handle: &Handle) -> Option<&LinkEntry> {
        self.entries.values().find(|e| &e.handle == handle)
    }

    /// Whether the owner has a live entry.
    pub fn contains(&self, owner: SubjectId) -> bool {
        self.entries.contains_key(&owner)
    }

    /// All live entries, ordered by owner id.
    pub fn iter(&self) -> impl Iterator<Item = &LinkEntry> {
        self.entries.values()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::DurationMs;

    fn t(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn subject(id: i64) -> SubjectId {
        SubjectId::new(id)
    }

    #[test]
    fn test_submit_creates_entry() {
        let mut registry = LinkRegistry::new();
        let mut ledger = Ledger::new();

        let entry = registry
            .submit(
                &mut ledger,
                subject(1),
                "https://x.com/alice/status/123",
                Some(MessageRef::new(10)),
                t(1000),
            )
            .unwrap();
        assert_eq!(entry.handle, Handle::new("alice"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(subject(1)));
    }

    #[test]
    fn test_unparseable_submission_rejected() {
        let mut registry = LinkRegistry::new();
        let mut ledger = Ledger::new();

        let result = registry.submit(&mut ledger, subject(1), "x.com/", None, t(0));
        assert_eq!(result.unwrap_err(), SessionError::InvalidLinkFormat);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_second_submission_by_same_owner_rejected() {
        let mut registry = LinkRegistry::new();
        let mut ledger = Ledger::new();

        registry
            .submit(&mut ledger, subject(1), "https://x.com/alice", None, t(0))
            .unwrap();
        let result = registry.submit(&mut ledger, subject(1), "https://x.com/other", None, t(1));
        assert_eq!(
            result.unwrap_err(),
            SessionError::DuplicateSubmission {
                subject: subject(1)
            }
        );
        // The original entry is untouched; eviction is the caller's call
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_banned_handle_rejected() {
        let mut registry = LinkRegistry::new();
        let mut ledger = Ledger::new();
        ledger.mute(
            subject(9),
            Some(Handle::new("alice")),
            DurationMs::from_mins(2880),
            "test ban",
            t(0),
        );

        let result = registry.submit(
            &mut ledger,
            subject(1),
            "https://x.com/Alice/status/5",
            None,
            t(1),
        );
        assert_eq!(
            result.unwrap_err(),
            SessionError::BannedHandle {
                handle: Handle::new("alice")
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_colliding_handle_rejected() {
        let mut registry = LinkRegistry::new();
        let mut ledger = Ledger::new();

        registry
            .submit(&mut ledger, subject(1), "https://x.com/alice", None, t(0))
            .unwrap();
        let result = registry.submit(
            &mut ledger,
            subject(2),
            "https://X.com/ALICE/status/77",
            None,
            t(1),
        );
        assert_eq!(
            result.unwrap_err(),
            SessionError::CollidingHandle {
                handle: Handle::new("alice"),
                holder: subject(1),
            }
        );
    }

    #[test]
    fn test_lookup_by_handle_is_case_insensitive() {
        let mut registry = LinkRegistry::new();
        let mut ledger = Ledger::new();

        registry
            .submit(&mut ledger, subject(1), "https://x.com/Alice", None, t(0))
            .unwrap();
        assert!(registry.lookup_by_handle(&Handle::new("ALICE")).is_some());
    }

    #[test]
    fn test_remove() {
        let mut registry = LinkRegistry::new();
        let mut ledger = Ledger::new();

        registry
            .submit(&mut ledger, subject(1), "https://x.com/alice", None, t(0))
            .unwrap();
        let removed = registry.remove(subject(1)).unwrap();
        assert_eq!(removed.handle, Handle::new("alice"));
        assert!(registry.remove(subject(1)).is_none());
        assert!(registry.is_empty());
    }
}
