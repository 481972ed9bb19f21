//! Ban/mute ledger
//!
//! Two kinds of restriction live here:
//!
//! - **Mutes**: temporary, per-subject, superseded by any newer mute for
//!   the same subject. Cleared when a session ends.
//! - **Bans**: persistent, keyed by normalized external handle, always a
//!   fixed 48-hour window from creation. They survive session open/close
//!   and expire lazily — a record past its window is evicted the moment it
//!   is consulted, so a stale ban is never reported as active.
//!
//! A mute at or above the 48-hour threshold with a known handle also bans
//! that handle. Re-banning replaces the record with a fresh window; a ban
//! is never extended in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use warden_core::{DurationMs, Handle, SubjectId, Timestamp};

/// Mute length at which the subject's handle is also banned.
pub const BAN_THRESHOLD: DurationMs = DurationMs::from_mins(2880);

/// Fixed ban window, regardless of the requested mute length.
pub const BAN_WINDOW: DurationMs = DurationMs::from_hours(48);

/// A temporary posting restriction on one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteRecord {
    /// The muted subject
    pub subject: SubjectId,
    /// Handle from the submission that triggered the mute, if known
    pub handle: Option<Handle>,
    /// When the restriction lapses
    pub expires_at: Timestamp,
    /// Why the mute was issued
    pub reason: String,
}

impl MuteRecord {
    /// Whether the mute is still in force at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

/// A persistent restriction on an external handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    /// The banned handle (normalized)
    pub handle: Handle,
    /// Subject who submitted under this handle, if known
    pub owner: Option<SubjectId>,
    /// When the ban was created
    pub created_at: Timestamp,
    /// Always `created_at + BAN_WINDOW`
    pub expires_at: Timestamp,
    /// Why the ban was issued
    pub reason: String,
}

impl BanRecord {
    /// Whether the ban window has elapsed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// The per-group moderation ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    mutes: BTreeMap<SubjectId, MuteRecord>,
    bans: BTreeMap<Handle, BanRecord>,
}

impl Ledger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the subject's mute, expiring `duration` from now.
    ///
    /// At or above [`BAN_THRESHOLD`], a provided handle is additionally
    /// banned for the fixed [`BAN_WINDOW`] — the ban window does not grow
    /// with longer mutes.
    pub fn mute(
        &mut self,
        subject: SubjectId,
        handle: Option<Handle>,
        duration: DurationMs,
        reason: &str,
        now: Timestamp,
    ) -> &MuteRecord {
        if duration >= BAN_THRESHOLD {
            if let Some(handle) = handle.clone() {
                self.ban(handle, Some(subject), reason, now);
            }
        }

        let record = MuteRecord {
            subject,
            handle,
            expires_at: now + duration,
            reason: reason.to_string(),
        };
        self.mutes.insert(subject, record);
        &self.mutes[&subject]
    }

    /// Ban a handle for the fixed window, replacing any existing record.
    pub fn ban(
        &mut self,
        handle: Handle,
        owner: Option<SubjectId>,
        reason: &str,
        now: Timestamp,
    ) -> &BanRecord {
        let record = BanRecord {
            handle: handle.clone(),
            owner,
            created_at: now,
            expires_at: now + BAN_WINDOW,
            reason: reason.to_string(),
        };
        self.bans.insert(handle.clone(), record);
        &self.bans[&handle]
    }

    /// Re-insert a mute record from a snapshot.
    pub(crate) fn restore_mute(&mut self, record: MuteRecord) {
        self.mutes.insert(record.subject, record);
    }

    /// Re-insert a ban record from a snapshot.
    pub(crate) fn restore_ban(&mut self, record: BanRecord) {
        self.bans.insert(record.handle.clone(), record);
    }

    /// Delete the subject's mute record, leaving any ban in place.
    pub fn unmute(&mut self, subject: SubjectId) -> Option<MuteRecord> {
        self.mutes.remove(&subject)
    }

    /// Delete the ban record for a handle.
    pub fn unban(&mut self, handle: &Handle) -> Option<BanRecord> {
        self.bans.remove(handle)
    }

    /// Whether the handle is currently banned.
    ///
    /// Evicts an expired record before answering, so the answer is never
    /// based on a stale ban.
    pub fn is_handle_banned(&mut self, handle: &Handle, now: Timestamp) -> bool {
        if let Some(record) = self.bans.get(handle) {
            if record.is_expired(now) {
                debug!(%handle, "evicting expired ban");
                self.bans.remove(handle);
                return false;
            }
            return true;
        }
        false
    }

    /// The subject's mute, if still in force at `now`.
    pub fn active_mute(&self, subject: SubjectId, now: Timestamp) -> Option<&MuteRecord> {
        self.mutes.get(&subject).filter(|m| m.is_active(now))
    }

    /// Bulk-evict every ban past its window. Returns how many were dropped.
    pub fn cleanup_expired(&mut self, now: Timestamp) -> usize {
        let before = self.bans.len();
        self.bans.retain(|_, record| !record.is_expired(now));
        let evicted = before - self.bans.len();
        if evicted > 0 {
            debug!(evicted, "bulk-evicted expired bans");
        }
        evicted
    }

    /// Drop every mute record. Ban records are untouched.
    pub fn clear_mutes(&mut self) {
        self.mutes.clear();
    }

    /// All mute records, ordered by subject.
    pub fn mutes(&self) -> impl Iterator<Item = &MuteRecord> {
        self.mutes.values()
    }

    /// All ban records, ordered by handle.
    pub fn bans(&self) -> impl Iterator<Item = &BanRecord> {
        self.bans.values()
    }
}
