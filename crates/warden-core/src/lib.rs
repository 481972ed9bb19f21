//! Warden Core - Interface layer for the engagement-session engine
//!
//! This crate defines the vocabulary shared by the domain and runtime
//! layers:
//!
//! - Identifier newtypes: [`GroupId`], [`SubjectId`], [`MessageRef`],
//!   [`Handle`]
//! - Wall-clock time: [`Timestamp`], [`DurationMs`]
//! - Effect traits for the external collaborators the engine consumes:
//!   the chat-platform gateway, the snapshot store, the clock, and the
//!   timer scheduler
//!
//! No business logic lives here. Domain rules are in `warden-session`;
//! concrete effect handlers are in `warden-runtime`.

pub mod effects;
pub mod identifiers;
pub mod time;

pub use identifiers::{GroupId, Handle, MessageRef, SubjectId};
pub use time::{DurationMs, Timestamp};

pub use effects::platform::{PlatformEffects, PlatformError};
pub use effects::scheduler::{SchedulerEffects, TimerKey, TimerTask};
pub use effects::store::{SnapshotStore, StoreError};
pub use effects::time::PhysicalTimeEffects;
