//! Wall-clock trait
//!
//! The domain layer takes explicit `now` arguments so its logic stays
//! synchronous and deterministic; only the runtime consults this trait,
//! once per inbound event or timer fire.

use crate::time::Timestamp;
use async_trait::async_trait;

/// Source of the current wall-clock time.
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// The current time in unix-epoch milliseconds.
    async fn now(&self) -> Timestamp;
}
