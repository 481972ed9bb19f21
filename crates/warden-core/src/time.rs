//! Wall-clock time for the engine
//!
//! The engine orders every ledger record, deadline, and submission by
//! unix-epoch milliseconds. Logical clocks are unnecessary here: each
//! group's state is mutated under a single serialization boundary, so a
//! plain physical timestamp is enough to decide expiry and ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A point in time, in unix-epoch milliseconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create from unix-epoch milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Unix-epoch milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub const fn since(&self, earlier: Timestamp) -> DurationMs {
        DurationMs(self.0.saturating_sub(earlier.0))
    }
}

impl Add<DurationMs> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: DurationMs) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A span of wall-clock time, in milliseconds.
///
/// Mute durations are quoted in minutes throughout the product, so the
/// minute constructor is the common entry point.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DurationMs(pub u64);

impl DurationMs {
    /// Create from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Create from whole seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000)
    }

    /// Create from whole minutes
    pub const fn from_mins(mins: u64) -> Self {
        Self(mins * 60_000)
    }

    /// Create from whole hours
    pub const fn from_hours(hours: u64) -> Self {
        Self(hours * 3_600_000)
    }

    /// Length in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Length in whole minutes, truncating
    pub const fn as_mins(&self) -> u64 {
        self.0 / 60_000
    }

    /// Convert to a std duration for sleeping.
    pub const fn to_std(self) -> std::time::Duration {
        std::time::Duration::from_millis(self.0)
    }
}

impl fmt::Display for DurationMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
