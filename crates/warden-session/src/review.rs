//! Proof re-review ("SR") workflow
//!
//! Reviewers flag a participant whose proof needs another look; the flag
//! holds a per-session sequence number so it can be approved by number
//! later. Alongside the flag queue this module keeps the set of subjects
//! with accepted proof ("safe"), and derives the "scam" set — participants
//! with a link but neither accepted proof nor a pending flag — on demand,
//! never incrementally.

use crate::error::SessionError;
use crate::links::LinkRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use warden_core::{SubjectId, Timestamp};

/// An active re-review flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrFlag {
    /// Per-session sequence number; strictly increasing, never reused
    pub seq: u64,
    /// The flagged subject
    pub subject: SubjectId,
    /// When the flag was raised
    pub flagged_at: Timestamp,
}

/// Flag queue plus the accepted-proof set for one session cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQueue {
    flags: BTreeMap<u64, SrFlag>,
    safe: BTreeSet<SubjectId>,
}

impl ReviewQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a subject for re-review under sequence number `seq`.
    ///
    /// The caller supplies the next session sequence number and must have
    /// verified the subject holds a link entry. A subject already flagged
    /// keeps its original flag and number.
    pub fn flag(
        &mut self,
        subject: SubjectId,
        seq: u64,
        now: Timestamp,
    ) -> Result<u64, SessionError> {
        if let Some(existing) = self.flag_for(subject) {
            return Err(SessionError::AlreadyFlagged {
                subject,
                seq: existing.seq,
            });
        }

        self.flags.insert(
            seq,
            SrFlag {
                seq,
                subject,
                flagged_at: now,
            },
        );
        // A flagged subject is no longer considered proven
        self.safe.remove(&subject);
        Ok(seq)
    }

    /// Resolve the flag with sequence number `seq`.
    ///
    /// With `proof_attached`, the subject moves to the safe set; without,
    /// they are merely unflagged and stay pending — part of the scam set
    /// until new proof arrives or they are flagged again.
    pub fn approve(&mut self, seq: u64, proof_attached: bool) -> Result<SubjectId, SessionError> {
        let flag = self
            .flags
            .remove(&seq)
            .ok_or_else(|| SessionError::not_found(format!("review flag #{seq}")))?;

        if proof_attached {
            self.safe.insert(flag.subject);
        }
        Ok(flag.subject)
    }

    /// Re-insert a flag from a snapshot, bypassing the duplicate check.
    pub(crate) fn restore_flag(&mut self, flag: SrFlag) {
        self.flags.insert(flag.seq, flag);
    }

    /// Record an accepted proof submission for an unflagged subject.
    pub fn mark_safe(&mut self, subject: SubjectId) {
        self.safe.insert(subject);
    }

    /// The subject's active flag, if any.
    pub fn flag_for(&self, subject: SubjectId) -> Option<&SrFlag> {
        self.flags.values().find(|f| f.subject == subject)
    }

    /// Whether the subject has accepted proof.
    pub fn is_safe(&self, subject: SubjectId) -> bool {
        self.safe.contains(&subject)
    }

    /// Active flags in sequence order.
    pub fn flags(&self) -> impl Iterator<Item = &SrFlag> {
        self.flags.values()
    }

    /// Subjects with accepted proof, in id order.
    pub fn safe_subjects(&self) -> impl Iterator<Item = SubjectId> + '_ {
        self.safe.iter().copied()
    }

    /// Derive the scam set: participants with a live link entry who have
    /// neither accepted proof nor a pending flag.
    ///
    /// Recomputed from scratch on every call; nothing here is maintained
    /// incrementally, so a partial update can never leave this stale.
    pub fn scam_set(&self, links: &LinkRegistry) -> Vec<SubjectId> {
        links
            .iter()
            .map(|entry| entry.owner)
            .filter(|owner| !self.safe.contains(owner) && self.flag_for(*owner).is_none())
            .collect()
    }

    /// Drop all flags and the safe set.
    pub fn clear(&mut self) {
        self.flags.clear();
        self.safe.clear();
    }
}
