//! Engine orchestration
//!
//! One [`Engine`] serves every group. Each group's state lives in a cell
//! behind its own async mutex, registered in a sync map: message-driven
//! events and timer fires for the same group serialize on the cell, while
//! distinct groups proceed in parallel.
//!
//! The lock discipline is strict: domain mutation and snapshot capture
//! happen under the cell lock; platform calls and snapshot saves happen
//! after it is released. A failed platform call or save is logged and
//! changes nothing — the ledger is the source of truth and is never
//! rolled back for an external failure.

use crate::config::EngineConfig;
use futures::future::join_all;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use warden_core::{
    DurationMs, GroupId, Handle, MessageRef, PhysicalTimeEffects, PlatformEffects,
    SchedulerEffects, SnapshotStore, SubjectId, TimerKey, TimerTask, Timestamp,
};
use warden_session::{
    Directive, GroupSession, GroupSnapshot, ProofOutcome, SessionError, SessionState,
    SessionStatus, SrFlag, SubmitOutcome,
};

struct GroupCell {
    state: GroupSession,
    hydrated: bool,
}

struct EngineInner {
    config: EngineConfig,
    platform: Arc<dyn PlatformEffects>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn PhysicalTimeEffects>,
    scheduler: Arc<dyn SchedulerEffects>,
    groups: SyncMutex<HashMap<GroupId, Arc<AsyncMutex<GroupCell>>>>,
}

/// The engagement-session engine.
///
/// Cheap to clone; clones share the same group cells and timers.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Wire an engine from its collaborators.
    pub fn new(
        config: EngineConfig,
        platform: Arc<dyn PlatformEffects>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn PhysicalTimeEffects>,
        scheduler: Arc<dyn SchedulerEffects>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                platform,
                store,
                clock,
                scheduler,
                groups: SyncMutex::new(HashMap::new()),
            }),
        }
    }

    // --- lifecycle ----------------------------------------------------

    /// Open a new submission window for the group and start its reminder.
    pub async fn open(&self, group: GroupId) -> Result<(), SessionError> {
        let now = self.inner.clock.now().await;
        let mut cell = self.group_cell(group).await;
        cell.state.open(now)?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        self.start_reminder(group);
        Ok(())
    }

    /// Freeze the group, stopping its timers; data stays intact.
    pub async fn lock(&self, group: GroupId) -> Result<(), SessionError> {
        let mut cell = self.group_cell(group).await;
        let directives = cell.state.lock()?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.inner.scheduler.cancel(group, TimerKey::Reminder);
        self.inner.scheduler.cancel(group, TimerKey::Deadline);
        self.persist(group, doc).await;
        self.execute(group, directives).await;
        Ok(())
    }

    /// Enter the checking phase; schedules the deadline and returns it.
    pub async fn check(&self, group: GroupId) -> Result<Timestamp, SessionError> {
        let now = self.inner.clock.now().await;
        let mut cell = self.group_cell(group).await;
        let deadline = cell.state.check(now)?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        self.start_reminder(group);
        self.schedule_deadline(group, deadline.since(now));
        Ok(deadline)
    }

    /// Close the group's session from any state and cancel its timers.
    pub async fn end(&self, group: GroupId) {
        let mut cell = self.group_cell(group).await;
        let directives = cell.state.end();
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.inner.scheduler.cancel_group(group);
        self.persist(group, doc).await;
        self.execute(group, directives).await;
    }

    // --- submissions --------------------------------------------------

    /// Route a link submission. Violation follow-ups (message deletion,
    /// mutes) are executed before this returns; the outcome still carries
    /// them for the caller's reporting.
    pub async fn submit_link(
        &self,
        group: GroupId,
        subject: SubjectId,
        text: &str,
        origin: Option<MessageRef>,
    ) -> Result<SubmitOutcome, SessionError> {
        let now = self.inner.clock.now().await;
        let mut cell = self.group_cell(group).await;
        let outcome = cell.state.submit_link(subject, text, origin, now)?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        if let SubmitOutcome::Rejected { directives, .. } = &outcome {
            self.execute(group, directives.clone()).await;
        }
        Ok(outcome)
    }

    /// Route a proof submission during the checking phase.
    pub async fn submit_proof(
        &self,
        group: GroupId,
        subject: SubjectId,
        qualifying: bool,
        origin: Option<MessageRef>,
    ) -> Result<ProofOutcome, SessionError> {
        let mut cell = self.group_cell(group).await;
        let (outcome, directives) = cell.state.submit_proof(subject, qualifying, origin)?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        self.execute(group, directives).await;
        Ok(outcome)
    }

    // --- review -------------------------------------------------------

    /// Flag a participant's proof for manual re-review.
    pub async fn flag_sr(&self, group: GroupId, subject: SubjectId) -> Result<u64, SessionError> {
        let now = self.inner.clock.now().await;
        let mut cell = self.group_cell(group).await;
        let seq = cell.state.flag_sr(subject, now)?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        Ok(seq)
    }

    /// Resolve a re-review flag by number.
    pub async fn approve_sr(
        &self,
        group: GroupId,
        seq: u64,
        proof_attached: bool,
    ) -> Result<SubjectId, SessionError> {
        let mut cell = self.group_cell(group).await;
        let subject = cell.state.approve_sr(seq, proof_attached)?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        Ok(subject)
    }

    // --- moderation ---------------------------------------------------

    /// Mute a subject; at or past the 48-hour threshold a provided handle
    /// is banned alongside.
    pub async fn mute(
        &self,
        group: GroupId,
        subject: SubjectId,
        handle: Option<Handle>,
        duration: DurationMs,
        reason: &str,
    ) {
        let now = self.inner.clock.now().await;
        let mut cell = self.group_cell(group).await;
        let directives = cell.state.mute(subject, handle, duration, reason, now);
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        self.execute(group, directives).await;
    }

    /// Lift a subject's mute; any ban on their handle stays.
    pub async fn unmute(&self, group: GroupId, subject: SubjectId) {
        let mut cell = self.group_cell(group).await;
        let directives = cell.state.unmute(subject);
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        self.execute(group, directives).await;
    }

    /// Delete the ban record for a handle.
    pub async fn unban(&self, group: GroupId, handle: &Handle) -> Result<(), SessionError> {
        let mut cell = self.group_cell(group).await;
        let directives = cell.state.unban(handle)?;
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        self.execute(group, directives).await;
        Ok(())
    }

    /// Whether a handle is currently banned in the group.
    pub async fn is_handle_banned(&self, group: GroupId, handle: &Handle) -> bool {
        let now = self.inner.clock.now().await;
        let mut cell = self.group_cell(group).await;
        let banned = cell.state.is_handle_banned(handle, now);
        // The check may have evicted an expired record
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        self.persist(group, doc).await;
        banned
    }

    /// Mute every scam-set and flagged subject for `duration`. Returns
    /// how many subjects were swept.
    pub async fn mute_all(&self, group: GroupId, duration: DurationMs) -> usize {
        let now = self.inner.clock.now().await;
        let mut cell = self.group_cell(group).await;
        let directives = cell.state.sweep(duration, "bulk moderation", now);
        let doc = Self::snapshot_doc(&cell.state);
        drop(cell);

        let swept = directives.len();
        self.persist(group, doc).await;
        self.execute(group, directives).await;
        swept
    }

    // --- queries ------------------------------------------------------

    /// Summary counts for reporting.
    pub async fn status(&self, group: GroupId) -> SessionStatus {
        self.group_cell(group).await.state.status()
    }

    /// Subjects with accepted proof.
    pub async fn safe_subjects(&self, group: GroupId) -> Vec<SubjectId> {
        self.group_cell(group).await.state.safe_subjects()
    }

    /// The scam set, derived on demand.
    pub async fn scam_subjects(&self, group: GroupId) -> Vec<SubjectId> {
        self.group_cell(group).await.state.scam_subjects()
    }

    /// Active re-review flags in sequence order.
    pub async fn sr_queue(&self, group: GroupId) -> Vec<SrFlag> {
        self.group_cell(group).await.state.sr_queue()
    }

    /// Count of current valid link entries.
    pub async fn total_links(&self, group: GroupId) -> u32 {
        self.group_cell(group).await.state.total_links()
    }

    /// Cancel every timer for every known group.
    pub fn shutdown(&self) {
        let groups: Vec<GroupId> = self.inner.groups.lock().keys().copied().collect();
        for group in groups {
            self.inner.scheduler.cancel_group(group);
        }
    }

    // --- timers -------------------------------------------------------

    fn start_reminder(&self, group: GroupId) {
        let engine = self.clone();
        let task: TimerTask = Box::new(move || {
            let engine = engine.clone();
            Box::pin(async move { engine.reminder_tick(group).await })
        });
        self.inner.scheduler.schedule_repeating(
            group,
            TimerKey::Reminder,
            self.inner.config.reminder_interval(),
            task,
        );
    }

    fn schedule_deadline(&self, group: GroupId, delay: DurationMs) {
        let engine = self.clone();
        let task: TimerTask = Box::new(move || {
            let engine = engine.clone();
            Box::pin(async move { engine.deadline_tick(group).await })
        });
        self.inner
            .scheduler
            .schedule_once(group, TimerKey::Deadline, delay, task);
    }

    /// One reminder fire: re-issue and re-pin the phase reminder,
    /// unpinning the previous one. A fire after the phase moved on does
    /// nothing.
    async fn reminder_tick(&self, group: GroupId) {
        let text = {
            let cell = self.group_cell(group).await;
            match cell.state.state() {
                SessionState::Open => self.inner.config.open_reminder_text.clone(),
                SessionState::Checking => self.inner.config.checking_reminder_text.clone(),
                state => {
                    debug!(%group, %state, "stale reminder fire ignored");
                    return;
                }
            }
        };

        // Send outside the cell lock; only the pin bookkeeping re-locks.
        let sent = match self.inner.platform.send_message(group, &text).await {
            Ok(message) => message,
            Err(error) => {
                warn!(%group, %error, "reminder send failed");
                return;
            }
        };

        let (previous, doc) = {
            let mut cell = self.group_cell(group).await;
            let previous = cell.state.rotate_pinned(sent);
            (previous, Self::snapshot_doc(&cell.state))
        };
        self.persist(group, doc).await;

        if let Some(message) = previous {
            if let Err(error) = self.inner.platform.unpin_message(group, message).await {
                debug!(%group, %error, "could not unpin previous reminder");
            }
        }
        if let Err(error) = self.inner.platform.pin_message(group, sent).await {
            warn!(%group, %error, "could not pin reminder");
        }
    }

    /// The one-shot deadline fire: if the group is still checking, lock
    /// it and run the moderation sweep. Stale fires are no-ops.
    async fn deadline_tick(&self, group: GroupId) {
        let now = self.inner.clock.now().await;
        let (directives, doc) = {
            let mut cell = self.group_cell(group).await;
            match cell.state.deadline_expired(now) {
                Some(directives) => (directives, Self::snapshot_doc(&cell.state)),
                None => return,
            }
        };

        // The sweep locked the session; its reminder stops with it.
        self.inner.scheduler.cancel(group, TimerKey::Reminder);
        self.persist(group, doc).await;
        self.execute(group, directives).await;
        info!(%group, "deadline sweep complete");
    }

    // --- plumbing -----------------------------------------------------

    /// Fetch the group's cell, creating and hydrating it on first access.
    async fn group_cell(&self, group: GroupId) -> OwnedMutexGuard<GroupCell> {
        let cell = {
            let mut groups = self.inner.groups.lock();
            groups
                .entry(group)
                .or_insert_with(|| {
                    Arc::new(AsyncMutex::new(GroupCell {
                        state: GroupSession::new(group, self.inner.config.policy()),
                        hydrated: false,
                    }))
                })
                .clone()
        };

        let mut guard = cell.lock_owned().await;
        if !guard.hydrated {
            guard.hydrated = true;
            match self.inner.store.load(group).await {
                Ok(Some(bytes)) => match GroupSnapshot::from_bytes(&bytes) {
                    Ok(snapshot) => {
                        debug!(%group, "restored group from snapshot");
                        guard.state = snapshot.restore(self.inner.config.policy());
                    }
                    Err(error) => {
                        warn!(%group, %error, "corrupt snapshot ignored, starting fresh");
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    warn!(%group, %error, "snapshot load failed, starting fresh");
                }
            }
        }
        guard
    }

    fn snapshot_doc(state: &GroupSession) -> Option<Vec<u8>> {
        match GroupSnapshot::capture(state).to_bytes() {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                warn!(group = %state.group(), %error, "snapshot encode failed");
                None
            }
        }
    }

    async fn persist(&self, group: GroupId, doc: Option<Vec<u8>>) {
        if let Some(doc) = doc {
            if let Err(error) = self.inner.store.save(group, &doc).await {
                warn!(%group, %error, "snapshot save failed");
            }
        }
    }

    /// Execute platform follow-ups, concurrently and best-effort.
    async fn execute(&self, group: GroupId, directives: Vec<Directive>) {
        join_all(
            directives
                .into_iter()
                .map(|directive| self.apply(group, directive)),
        )
        .await;
    }

    async fn apply(&self, group: GroupId, directive: Directive) {
        let platform = &self.inner.platform;
        let result = match &directive {
            Directive::Restrict { subject, until } => {
                platform.restrict(group, *subject, *until).await
            }
            Directive::Unrestrict { subject } => platform.unrestrict(group, *subject).await,
            Directive::UnbanMember { subject } => platform.unban_member(group, *subject).await,
            Directive::DeleteMessage { message } => platform.delete_message(group, *message).await,
            Directive::Unpin { message } => platform.unpin_message(group, *message).await,
            Directive::NotifyProofPending { subject, handle } => {
                let text = match handle {
                    Some(handle) => {
                        format!("{subject} ({handle}) submitted new proof - waiting for review")
                    }
                    None => format!("{subject} submitted new proof - waiting for review"),
                };
                platform.send_message(group, &text).await.map(|_| ())
            }
        };

        if let Err(error) = result {
            warn!(%group, ?directive, %error, "platform follow-up failed");
        }
    }
}
