//! Warden Runtime - Engine orchestration layer
//!
//! Wires the `warden-session` domain to the outside world:
//!
//! - [`engine::Engine`]: per-group serialized cells, snapshot
//!   load/save, and best-effort platform follow-up execution
//! - [`scheduler::TokioScheduler`]: keyed reminder and deadline timers
//! - [`config::EngineConfig`]: product constants with TOML overrides
//! - [`handlers`]: system/simulated clocks and the in-memory snapshot
//!   store
//!
//! The engine's public operations are the entire surface a command layer
//! needs: `open`, `lock`, `check`, `end`, `submit_link`, `submit_proof`,
//! `flag_sr`, `approve_sr`, `mute`, `unmute`, `unban`,
//! `is_handle_banned`, `mute_all`, and the read-only reports.

pub mod config;
pub mod engine;
pub mod handlers;
pub mod scheduler;

pub use config::EngineConfig;
pub use engine::Engine;
pub use handlers::{MemorySnapshotStore, SimulatedTimeHandler, SystemTimeHandler};
pub use scheduler::TokioScheduler;
