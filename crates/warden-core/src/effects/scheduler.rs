//! Keyed timer scheduling trait
//!
//! The engine runs two timers per group: a repeating reminder and a
//! one-shot deadline. Both are addressed by `(group, key)`, and the
//! scheduler guarantees at most one live schedule per address — starting a
//! new timer for an address cancels the previous one. This keeps timer
//! lifecycle auditable and rules out orphaned reminder loops after a
//! reopen.

use crate::identifiers::GroupId;
use crate::time::DurationMs;
use futures::future::BoxFuture;
use std::fmt;

/// The two timer slots a group can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    /// Repeating reminder while a phase is accepting submissions.
    Reminder,
    /// One-shot checking-phase deadline.
    Deadline,
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKey::Reminder => write!(f, "reminder"),
            TimerKey::Deadline => write!(f, "deadline"),
        }
    }
}

/// A deferred unit of work produced each time a timer fires.
pub type TimerTask = Box<dyn FnMut() -> BoxFuture<'static, ()> + Send>;

/// Keyed one-shot and repeating timers.
///
/// Callbacks must tolerate firing after the state they were scheduled for
/// has moved on; the scheduler itself makes no freshness guarantee beyond
/// the single-live-schedule rule.
pub trait SchedulerEffects: Send + Sync {
    /// Run `task` once after `delay`, replacing any live schedule for
    /// `(group, key)`.
    fn schedule_once(&self, group: GroupId, key: TimerKey, delay: DurationMs, task: TimerTask);

    /// Run `task` every `interval` until cancelled, replacing any live
    /// schedule for `(group, key)`. The first fire happens one full
    /// interval after scheduling.
    fn schedule_repeating(&self, group: GroupId, key: TimerKey, interval: DurationMs, task: TimerTask);

    /// Cancel the live schedule for `(group, key)`, if any.
    fn cancel(&self, group: GroupId, key: TimerKey);

    /// Cancel every live schedule for the group.
    fn cancel_group(&self, group: GroupId);
}
