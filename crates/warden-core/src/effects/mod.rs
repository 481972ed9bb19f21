//! Effect traits for the engine's external collaborators
//!
//! The engine consumes four capabilities, each behind its own trait so the
//! runtime can wire real handlers in production and deterministic ones in
//! tests:
//!
//! - [`platform::PlatformEffects`]: the chat-platform gateway (restrict,
//!   ban, message and pin management, admin queries)
//! - [`store::SnapshotStore`]: document persistence for per-group
//!   snapshots
//! - [`time::PhysicalTimeEffects`]: the wall clock
//! - [`scheduler::SchedulerEffects`]: keyed one-shot and repeating timers
//!
//! All platform and persistence calls are best-effort from the engine's
//! point of view: a failure is logged by the caller and never rolls back
//! domain state.

pub mod platform;
pub mod scheduler;
pub mod store;
pub mod time;
