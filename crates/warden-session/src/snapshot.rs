//! Group snapshot schema
//!
//! One schema-defined document per group, with a single
//! serialize/deserialize pair used by every persistence path. The
//! document captures everything the engine needs to resume a group after
//! a restart: lifecycle state, live link entries, the full ledger, and
//! the review queue with its counters.

use crate::group::{GroupSession, ModerationPolicy};
use crate::ledger::{BanRecord, Ledger, MuteRecord};
use crate::links::{LinkEntry, LinkRegistry};
use crate::review::{ReviewQueue, SrFlag};
use crate::state::{Session, SessionState};
use serde::{Deserialize, Serialize};
use warden_core::{GroupId, MessageRef, SubjectId, Timestamp};

/// Serialized form of one group's complete engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    /// The group this document belongs to
    pub group: GroupId,
    /// Lifecycle state
    pub state: SessionState,
    /// When the current cycle opened
    pub opened_at: Option<Timestamp>,
    /// Live checking deadline
    pub deadline: Option<Timestamp>,
    /// Current valid link entries
    pub link_count: u32,
    /// Next re-review sequence number
    pub sr_counter: u64,
    /// Currently pinned reminder
    pub pinned_reminder: Option<MessageRef>,
    /// Live link entries
    pub links: Vec<LinkEntry>,
    /// Temporary mute records
    pub mutes: Vec<MuteRecord>,
    /// Persistent ban records
    pub bans: Vec<BanRecord>,
    /// Active re-review flags
    pub flags: Vec<SrFlag>,
    /// Subjects with accepted proof
    pub safe: Vec<SubjectId>,
}

impl GroupSnapshot {
    /// Capture a group's current state.
    pub fn capture(gs: &GroupSession) -> Self {
        Self {
            group: gs.group(),
            state: gs.session.state,
            opened_at: gs.session.opened_at,
            deadline: gs.session.deadline,
            link_count: gs.session.link_count,
            sr_counter: gs.session.sr_counter,
            pinned_reminder: gs.session.pinned_reminder,
            links: gs.links.iter().cloned().collect(),
            mutes: gs.ledger.mutes().cloned().collect(),
            bans: gs.ledger.bans().cloned().collect(),
            flags: gs.review.flags().cloned().collect(),
            safe: gs.review.safe_subjects().collect(),
        }
    }

    /// Rebuild the group session this document describes.
    pub fn restore(self, policy: ModerationPolicy) -> GroupSession {
        let session = Session {
            state: self.state,
            opened_at: self.opened_at,
            deadline: self.deadline,
            link_count: self.link_count,
            sr_counter: self.sr_counter,
            pinned_reminder: self.pinned_reminder,
        };

        let mut links = LinkRegistry::new();
        let mut ledger = Ledger::new();
        let mut review = ReviewQueue::new();
        restore_links(&mut links, self.links);
        restore_ledger(&mut ledger, self.mutes, self.bans);
        restore_review(&mut review, self.flags, self.safe);

        GroupSession::from_parts(self.group, session, links, ledger, review, policy)
    }

    /// Encode to the stored document form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from the stored document form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn restore_links(registry: &mut LinkRegistry, entries: Vec<LinkEntry>) {
    for entry in entries {
        registry.restore(entry);
    }
}

fn restore_ledger(ledger: &mut Ledger, mutes: Vec<MuteRecord>, bans: Vec<BanRecord>) {
    for record in mutes {
        ledger.restore_mute(record);
    }
    for record in bans {
        ledger.restore_ban(record);
    }
}

fn restore_review(review: &mut ReviewQueue, flags: Vec<SrFlag>, safe: Vec<SubjectId>) {
    for flag in flags {
        review.restore_flag(flag);
    }
    for subject in safe {
        review.mark_safe(subject);
    }
}
