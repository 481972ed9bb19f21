//! Tokio-backed timer scheduler
//!
//! Keeps one join handle per `(group, key)`; scheduling over a live entry
//! aborts the old task first, so a group can never accumulate duplicate
//! reminder loops or deadlines. Cancellation aborts the task outright —
//! timer callbacks re-validate state at fire time, so an abort between
//! fire and completion loses nothing that matters.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use warden_core::{DurationMs, GroupId, SchedulerEffects, TimerKey, TimerTask};

/// Timer registry on top of `tokio::time`.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    tasks: Mutex<HashMap<(GroupId, TimerKey), JoinHandle<()>>>,
}

impl TokioScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&self, group: GroupId, key: TimerKey, handle: JoinHandle<()>) {
        if let Some(old) = self.tasks.lock().insert((group, key), handle) {
            old.abort();
        }
    }

    /// Number of registered schedules, counting finished one-shots until
    /// they are replaced or cancelled.
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether no schedules are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl SchedulerEffects for TokioScheduler {
    fn schedule_once(&self, group: GroupId, key: TimerKey, delay: DurationMs, mut task: TimerTask) {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay.to_std()).await;
            task().await;
        });
        self.replace(group, key, handle);
    }

    fn schedule_repeating(
        &self,
        group: GroupId,
        key: TimerKey,
        interval: DurationMs,
        mut task: TimerTask,
    ) {
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval.to_std()).await;
                task().await;
            }
        });
        self.replace(group, key, handle);
    }

    fn cancel(&self, group: GroupId, key: TimerKey) {
        if let Some(handle) = self.tasks.lock().remove(&(group, key)) {
            handle.abort();
        }
    }

    fn cancel_group(&self, group: GroupId) {
        self.tasks.lock().retain(|(g, _), handle| {
            if *g == group {
                handle.abort();
                false
            } else {
                true
            }
        });
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for handle in self.tasks.lock().values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: Arc<AtomicUsize>) -> TimerTask {
        Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_once() {
        let scheduler = TokioScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let group = GroupId::new(1);

        scheduler.schedule_once(
            group,
            TimerKey::Deadline,
            DurationMs::from_secs(10),
            counting_task(counter.clone()),
        );

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_fires_until_cancel() {
        let scheduler = TokioScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let group = GroupId::new(1);

        scheduler.schedule_repeating(
            group,
            TimerKey::Reminder,
            DurationMs::from_secs(10),
            counting_task(counter.clone()),
        );

        tokio::time::sleep(std::time::Duration::from_secs(35)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        scheduler.cancel(group, TimerKey::Reminder);
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_prior() {
        let scheduler = TokioScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let group = GroupId::new(1);

        scheduler.schedule_once(
            group,
            TimerKey::Deadline,
            DurationMs::from_secs(10),
            counting_task(first.clone()),
        );
        scheduler.schedule_once(
            group,
            TimerKey::Deadline,
            DurationMs::from_secs(10),
            counting_task(second.clone()),
        );

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_group_leaves_other_groups() {
        let scheduler = TokioScheduler::new();
        let kept = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicUsize::new(0));

        scheduler.schedule_repeating(
            GroupId::new(1),
            TimerKey::Reminder,
            DurationMs::from_secs(10),
            counting_task(cancelled.clone()),
        );
        scheduler.schedule_repeating(
            GroupId::new(2),
            TimerKey::Reminder,
            DurationMs::from_secs(10),
            counting_task(kept.clone()),
        );

        scheduler.cancel_group(GroupId::new(1));
        tokio::time::sleep(std::time::Duration::from_secs(25)).await;

        assert_eq!(cancelled.load(Ordering::SeqCst), 0);
        assert_eq!(kept.load(Ordering::SeqCst), 2);
    }
}
