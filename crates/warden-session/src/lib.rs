//! Warden Session - Engagement-session domain layer
//!
//! This crate implements the moderation rules of a timed engagement
//! session, free of I/O and async:
//!
//! - [`state`]: the five-state session lifecycle
//! - [`links`]: link submission validation and deduplication
//! - [`ledger`]: temporary mutes and persistent 48-hour handle bans
//! - [`review`]: the proof re-review ("SR") queue and the derived
//!   safe/scam sets
//! - [`group`]: the per-group aggregate enforcing the protocol between
//!   the pieces, emitting [`Directive`]s for the runtime to execute
//! - [`snapshot`]: the persisted document schema
//!
//! Every mutation takes an explicit `now`, so the whole layer is
//! deterministic under test. The runtime in `warden-runtime` supplies the
//! clock, the per-group serialization boundary, the timers, and the
//! platform gateway.

pub mod error;
pub mod group;
pub mod handle;
pub mod ledger;
pub mod links;
pub mod review;
pub mod snapshot;
pub mod state;

pub use error::SessionError;
pub use group::{
    Directive, GroupSession, ModerationPolicy, ProofOutcome, SessionStatus, SubmitOutcome,
};
pub use handle::{extract_handle, is_post_link};
pub use ledger::{BanRecord, Ledger, MuteRecord, BAN_THRESHOLD, BAN_WINDOW};
pub use links::{LinkEntry, LinkRegistry};
pub use review::{ReviewQueue, SrFlag};
pub use snapshot::GroupSnapshot;
pub use state::{Session, SessionState};
