//! Concrete effect handlers
//!
//! Production wiring uses [`SystemTimeHandler`] and whatever snapshot
//! store the deployment provides; [`MemorySnapshotStore`] backs tests and
//! single-process runs, and [`SimulatedTimeHandler`] gives tests a clock
//! they can advance by hand.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use warden_core::{GroupId, PhysicalTimeEffects, SnapshotStore, StoreError, Timestamp};

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Default)]
pub struct SystemTimeHandler;

impl SystemTimeHandler {
    /// Create a system clock handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for SystemTimeHandler {
    async fn now(&self) -> Timestamp {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp::from_millis(ms)
    }
}

/// Simulated clock for deterministic tests.
///
/// Starts at a fixed time and only moves when advanced explicitly.
#[derive(Debug, Clone)]
pub struct SimulatedTimeHandler {
    current: Arc<Mutex<u64>>,
}

impl SimulatedTimeHandler {
    /// Create a simulated clock starting at the given time.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Arc::new(Mutex::new(start.as_millis())),
        }
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        *self.current.lock() += ms;
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, time: Timestamp) {
        *self.current.lock() = time.as_millis();
    }

    /// Read the clock without going through the trait.
    pub fn get(&self) -> Timestamp {
        Timestamp::from_millis(*self.current.lock())
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedTimeHandler {
    async fn now(&self) -> Timestamp {
        self.get()
    }
}

/// In-memory snapshot store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    documents: Mutex<HashMap<GroupId, Vec<u8>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, group: GroupId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.documents.lock().get(&group).cloned())
    }

    async fn save(&self, group: GroupId, document: &[u8]) -> Result<(), StoreError> {
        self.documents.lock().insert(group, document.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_clock_advances() {
        let clock = SimulatedTimeHandler::new(Timestamp::from_millis(1000));
        assert_eq!(clock.now().await, Timestamp::from_millis(1000));
        clock.advance(500);
        assert_eq!(clock.now().await, Timestamp::from_millis(1500));
        clock.set(Timestamp::from_millis(99));
        assert_eq!(clock.now().await, Timestamp::from_millis(99));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySnapshotStore::new();
        let group = GroupId::new(-5);
        assert_eq!(store.load(group).await.unwrap(), None);

        store.save(group, b"doc-1").await.unwrap();
        store.save(group, b"doc-2").await.unwrap();
        assert_eq!(store.load(group).await.unwrap(), Some(b"doc-2".to_vec()));
        assert_eq!(store.len(), 1);
    }
}
