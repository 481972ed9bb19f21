//! Group session aggregate
//!
//! One [`GroupSession`] per group owns the session state machine, link
//! registry, moderation ledger, and review queue, and enforces the
//! protocol between them. Mutations are synchronous; where a rule calls
//! for platform side effects (restrict a member, delete a message, unpin
//! a reminder), the method returns [`Directive`]s for the runtime to
//! execute after it has released the group's lock. Directives are
//! best-effort: ledger state is already final when they are issued and is
//! never rolled back if one fails.

use crate::error::SessionError;
use crate::ledger::Ledger;
use crate::links::LinkRegistry;
use crate::review::{ReviewQueue, SrFlag};
use crate::state::{Session, SessionState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use warden_core::{DurationMs, GroupId, Handle, MessageRef, SubjectId, Timestamp};

/// Mute durations and the checking window, as product policy.
///
/// `link_count` tracks current valid entries, so violation evictions
/// decrement it; see DESIGN.md for the product decision behind that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationPolicy {
    /// Mute for duplicate/colliding/banned-handle submissions
    pub violation_mute: DurationMs,
    /// Mute for link-shaped text no handle can be extracted from
    pub invalid_link_mute: DurationMs,
    /// Mute applied by the deadline sweep; at or past the ban threshold,
    /// so swept handles are banned too
    pub sweep_mute: DurationMs,
    /// Length of the checking phase
    pub checking_window: DurationMs,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            violation_mute: DurationMs::from_mins(30),
            invalid_link_mute: DurationMs::from_mins(5),
            sweep_mute: DurationMs::from_mins(2880),
            checking_window: DurationMs::from_mins(90),
        }
    }
}

/// A platform side effect required by a completed domain mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Restrict the subject from posting until the given time.
    Restrict {
        /// Subject to restrict
        subject: SubjectId,
        /// When the restriction lapses
        until: Timestamp,
    },
    /// Lift the subject's posting restriction.
    Unrestrict {
        /// Subject to release
        subject: SubjectId,
    },
    /// Let a previously removed member back into the group.
    UnbanMember {
        /// Member to readmit
        subject: SubjectId,
    },
    /// Delete a message from the group.
    DeleteMessage {
        /// Message to delete
        message: MessageRef,
    },
    /// Unpin a previously pinned reminder.
    Unpin {
        /// Message to unpin
        message: MessageRef,
    },
    /// Tell reviewers a flagged subject submitted fresh proof.
    NotifyProofPending {
        /// The flagged subject
        subject: SubjectId,
        /// Their submitted handle, if their entry is still live
        handle: Option<Handle>,
    },
}

/// Result of a link submission while the window is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Entry created and counted.
    Accepted {
        /// The extracted handle
        handle: Handle,
    },
    /// The submission violated a rule. Ledger consequences are already
    /// applied; `directives` carry the required platform follow-ups.
    Rejected {
        /// Which rule was violated
        reason: SessionError,
        /// Required follow-up actions
        directives: Vec<Directive>,
    },
}

/// Result of a proof submission during the checking phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofOutcome {
    /// Subject now counts as safe.
    MarkedSafe,
    /// Subject is flagged; reviewers were notified, the flag stands.
    PendingReview {
        /// Sequence number of the standing flag
        seq: u64,
    },
    /// Subject never submitted a link; the message is removed.
    NotParticipating,
    /// Non-qualifying submission; no state change.
    Ignored,
}

/// Read-only summary of a group's moderation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Current lifecycle state
    pub state: SessionState,
    /// Checking deadline, if one is live
    pub deadline: Option<Timestamp>,
    /// Current valid link entries
    pub link_count: u32,
    /// Active re-review flags
    pub flagged: usize,
    /// Subjects with accepted proof
    pub safe: usize,
    /// Ban records on file (including not-yet-evicted expired ones)
    pub banned_handles: usize,
}

/// Everything the engine knows about one group.
#[derive(Debug, Clone)]
pub struct GroupSession {
    group: GroupId,
    pub(crate) session: Session,
    pub(crate) links: LinkRegistry,
    pub(crate) ledger: Ledger,
    pub(crate) review: ReviewQueue,
    policy: ModerationPolicy,
}

impl GroupSession {
    /// A fresh, idle group session.
    pub fn new(group: GroupId, policy: ModerationPolicy) -> Self {
        Self {
            group,
            session: Session::new(),
            links: LinkRegistry::new(),
            ledger: Ledger::new(),
            review: ReviewQueue::new(),
            policy,
        }
    }

    /// Rebuild from snapshot parts.
    pub(crate) fn from_parts(
        group: GroupId,
        session: Session,
        links: LinkRegistry,
        ledger: Ledger,
        review: ReviewQueue,
        policy: ModerationPolicy,
    ) -> Self {
        Self {
            group,
            session,
            links,
            ledger,
            review,
            policy,
        }
    }

    /// The group this session belongs to.
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// The active moderation policy.
    pub fn policy(&self) -> &ModerationPolicy {
        &self.policy
    }

    // --- lifecycle ---------------------------------------------------

    /// Open a new submission window.
    ///
    /// Clears the registry and review queue and evicts expired bans; live
    /// bans and mute records survive the reset.
    pub fn open(&mut self, now: Timestamp) -> Result<(), SessionError> {
        self.session.open(now)?;
        self.links.clear();
        self.review.clear();
        self.ledger.cleanup_expired(now);
        info!(group = %self.group, "session opened");
        Ok(())
    }

    /// Freeze posting, keeping all data.
    pub fn lock(&mut self) -> Result<Vec<Directive>, SessionError> {
        self.session.lock()?;
        let mut directives = Vec::new();
        if let Some(message) = self.session.pinned_reminder.take() {
            directives.push(Directive::Unpin { message });
        }
        info!(group = %self.group, "session locked");
        Ok(directives)
    }

    /// Enter the checking phase; returns the deadline the runtime must
    /// schedule.
    pub fn check(&mut self, now: Timestamp) -> Result<Timestamp, SessionError> {
        let deadline = self.session.check(now, self.policy.checking_window)?;
        info!(group = %self.group, %deadline, "checking phase started");
        Ok(deadline)
    }

    /// Close the session from any state.
    ///
    /// Clears all session-scoped data and temporary mutes; ban records
    /// are untouched.
    pub fn end(&mut self) -> Vec<Directive> {
        let mut directives = Vec::new();
        if let Some(message) = self.session.pinned_reminder.take() {
            directives.push(Directive::Unpin { message });
        }
        self.session.end();
        self.links.clear();
        self.review.clear();
        self.ledger.clear_mutes();
        info!(group = %self.group, "session ended");
        directives
    }

    // --- submissions -------------------------------------------------

    /// Handle a link submission while the window is open.
    ///
    /// Violations are normal protocol outcomes: the offending entries are
    /// already evicted and the mute records written when this returns
    /// [`SubmitOutcome::Rejected`]. Submitting outside the open window is
    /// an [`SessionError::InvalidTransition`] instead.
    pub fn submit_link(
        &mut self,
        subject: SubjectId,
        text: &str,
        origin: Option<MessageRef>,
        now: Timestamp,
    ) -> Result<SubmitOutcome, SessionError> {
        if !self.session.accepts_links() {
            return Err(SessionError::invalid_transition(
                self.session.state,
                "submit a link",
            ));
        }

        match self.links.submit(&mut self.ledger, subject, text, origin, now) {
            Ok(entry) => {
                let handle = entry.handle.clone();
                self.session.link_count += 1;
                debug!(group = %self.group, %subject, %handle, "link accepted");
                Ok(SubmitOutcome::Accepted { handle })
            }
            Err(reason) => {
                let directives = self.enforce_submission_violation(&reason, subject, origin, now);
                info!(group = %self.group, %subject, %reason, "submission rejected");
                Ok(SubmitOutcome::Rejected { reason, directives })
            }
        }
    }

    /// Apply the ledger consequences a submission violation calls for and
    /// collect the platform follow-ups.
    fn enforce_submission_violation(
        &mut self,
        reason: &SessionError,
        subject: SubjectId,
        origin: Option<MessageRef>,
        now: Timestamp,
    ) -> Vec<Directive> {
        let mut directives = Vec::new();
        if let Some(message) = origin {
            directives.push(Directive::DeleteMessage { message });
        }

        match reason {
            SessionError::InvalidLinkFormat => {
                directives.push(self.apply_mute(
                    subject,
                    None,
                    self.policy.invalid_link_mute,
                    "invalid link format",
                    now,
                ));
            }
            SessionError::DuplicateSubmission { .. } => {
                self.evict_entry(subject);
                directives.push(self.apply_mute(
                    subject,
                    None,
                    self.policy.violation_mute,
                    "multiple links",
                    now,
                ));
            }
            SessionError::BannedHandle { handle } => {
                directives.push(self.apply_mute(
                    subject,
                    Some(handle.clone()),
                    self.policy.violation_mute,
                    "reused banned handle",
                    now,
                ));
            }
            SessionError::CollidingHandle { handle, holder } => {
                self.evict_entry(*holder);
                directives.push(self.apply_mute(
                    *holder,
                    Some(handle.clone()),
                    self.policy.violation_mute,
                    "handle collision",
                    now,
                ));
                directives.push(self.apply_mute(
                    subject,
                    Some(handle.clone()),
                    self.policy.violation_mute,
                    "handle collision",
                    now,
                ));
            }
            _ => {}
        }
        directives
    }

    fn evict_entry(&mut self, subject: SubjectId) {
        if self.links.remove(subject).is_some() {
            self.session.link_count = self.session.link_count.saturating_sub(1);
        }
    }

    fn apply_mute(
        &mut self,
        subject: SubjectId,
        handle: Option<Handle>,
        duration: DurationMs,
        reason: &str,
        now: Timestamp,
    ) -> Directive {
        let record = self.ledger.mute(subject, handle, duration, reason, now);
        Directive::Restrict {
            subject,
            until: record.expires_at,
        }
    }

    /// Handle a proof submission during the checking phase.
    pub fn submit_proof(
        &mut self,
        subject: SubjectId,
        qualifying: bool,
        origin: Option<MessageRef>,
    ) -> Result<(ProofOutcome, Vec<Directive>), SessionError> {
        if !self.session.accepts_proof() {
            return Err(SessionError::invalid_transition(
                self.session.state,
                "submit proof",
            ));
        }

        if !self.links.contains(subject) {
            let directives = origin
                .map(|message| Directive::DeleteMessage { message })
                .into_iter()
                .collect();
            return Ok((ProofOutcome::NotParticipating, directives));
        }

        if !qualifying {
            return Ok((ProofOutcome::Ignored, Vec::new()));
        }

        if let Some(flag) = self.review.flag_for(subject) {
            // New proof never clears a flag by itself; reviewers decide.
            let seq = flag.seq;
            let handle = self.links.lookup(subject).map(|e| e.handle.clone());
            return Ok((
                ProofOutcome::PendingReview { seq },
                vec![Directive::NotifyProofPending { subject, handle }],
            ));
        }

        self.review.mark_safe(subject);
        debug!(group = %self.group, %subject, "proof accepted");
        Ok((ProofOutcome::MarkedSafe, Vec::new()))
    }

    // --- review ------------------------------------------------------

    /// Flag a participant's proof for manual re-review.
    pub fn flag_sr(&mut self, subject: SubjectId, now: Timestamp) -> Result<u64, SessionError> {
        if !self.links.contains(subject) {
            return Err(SessionError::not_found(format!("link entry for {subject}")));
        }
        if let Some(existing) = self.review.flag_for(subject) {
            return Err(SessionError::AlreadyFlagged {
                subject,
                seq: existing.seq,
            });
        }

        let seq = self.session.next_sr_seq();
        self.review.flag(subject, seq, now)?;
        info!(group = %self.group, %subject, seq, "flagged for re-review");
        Ok(seq)
    }

    /// Resolve a re-review flag by its number.
    pub fn approve_sr(&mut self, seq: u64, proof_attached: bool) -> Result<SubjectId, SessionError> {
        let subject = self.review.approve(seq, proof_attached)?;
        info!(group = %self.group, %subject, seq, proof_attached, "re-review resolved");
        Ok(subject)
    }

    // --- moderation --------------------------------------------------

    /// Mute a subject, banning their handle too at or past the 48-hour
    /// threshold.
    pub fn mute(
        &mut self,
        subject: SubjectId,
        handle: Option<Handle>,
        duration: DurationMs,
        reason: &str,
        now: Timestamp,
    ) -> Vec<Directive> {
        vec![self.apply_mute(subject, handle, duration, reason, now)]
    }

    /// Delete the subject's mute record and lift their restriction. Any
    /// ban on their handle stays.
    pub fn unmute(&mut self, subject: SubjectId) -> Vec<Directive> {
        self.ledger.unmute(subject);
        vec![Directive::Unrestrict { subject }]
    }

    /// Delete the ban record for a handle.
    pub fn unban(&mut self, handle: &Handle) -> Result<Vec<Directive>, SessionError> {
        match self.ledger.unban(handle) {
            Some(record) => Ok(record
                .owner
                .map(|subject| Directive::UnbanMember { subject })
                .into_iter()
                .collect()),
            None => Err(SessionError::not_found(format!("ban record for {handle}"))),
        }
    }

    /// Whether a handle is currently banned (with lazy eviction).
    pub fn is_handle_banned(&mut self, handle: &Handle, now: Timestamp) -> bool {
        self.ledger.is_handle_banned(handle, now)
    }

    /// Mute every scam-set subject and every flagged subject for
    /// `duration`; at or past the ban threshold their handles are banned
    /// alongside.
    pub fn sweep(&mut self, duration: DurationMs, reason: &str, now: Timestamp) -> Vec<Directive> {
        let mut targets: Vec<(SubjectId, Option<Handle>)> = self
            .review
            .scam_set(&self.links)
            .into_iter()
            .map(|subject| {
                let handle = self.links.lookup(subject).map(|e| e.handle.clone());
                (subject, handle)
            })
            .collect();

        // Flagged subjects are swept too; the scam set excludes them, so
        // no target appears twice.
        let flagged: Vec<SubjectId> = self.review.flags().map(|f| f.subject).collect();
        for subject in flagged {
            let handle = self.links.lookup(subject).map(|e| e.handle.clone());
            targets.push((subject, handle));
        }

        let mut directives = Vec::with_capacity(targets.len());
        for (subject, handle) in targets {
            directives.push(self.apply_mute(subject, handle, duration, reason, now));
        }
        info!(group = %self.group, swept = directives.len(), reason, "moderation sweep");
        directives
    }

    /// The deadline timer fired. A no-op unless the session is still in
    /// the checking phase; otherwise locks the group and runs the sweep.
    pub fn deadline_expired(&mut self, now: Timestamp) -> Option<Vec<Directive>> {
        if self.session.state != SessionState::Checking {
            debug!(group = %self.group, state = %self.session.state, "stale deadline fire ignored");
            return None;
        }

        let mut directives = self.lock().ok()?;
        directives.extend(self.sweep(self.policy.sweep_mute, "deadline-sweep", now));
        Some(directives)
    }

    // --- reminder pin tracking ---------------------------------------

    /// Record a newly pinned reminder, returning the previous one for
    /// unpinning.
    pub fn rotate_pinned(&mut self, message: MessageRef) -> Option<MessageRef> {
        self.session.pinned_reminder.replace(message)
    }

    // --- queries -----------------------------------------------------

    /// Summary counts for reporting.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.session.state,
            deadline: self.session.deadline,
            link_count: self.session.link_count,
            flagged: self.review.flags().count(),
            safe: self.review.safe_subjects().count(),
            banned_handles: self.ledger.bans().count(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// Checking deadline, if one is live.
    pub fn deadline(&self) -> Option<Timestamp> {
        self.session.deadline
    }

    /// Count of current valid link entries.
    pub fn total_links(&self) -> u32 {
        self.session.link_count
    }

    /// The subject's live link entry, if any.
    pub fn link_for(&self, subject: SubjectId) -> Option<&crate::links::LinkEntry> {
        self.links.lookup(subject)
    }

    /// Subjects with accepted proof, in id order.
    pub fn safe_subjects(&self) -> Vec<SubjectId> {
        self.review.safe_subjects().collect()
    }

    /// The scam set, derived on demand.
    pub fn scam_subjects(&self) -> Vec<SubjectId> {
        self.review.scam_set(&self.links)
    }

    /// Active re-review flags in sequence order.
    pub fn sr_queue(&self) -> Vec<SrFlag> {
        self.review.flags().cloned().collect()
    }
}
