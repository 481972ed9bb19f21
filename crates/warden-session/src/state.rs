//! Session lifecycle state machine
//!
//! Each group owns exactly one [`Session`], always in one of five states:
//!
//! ```text
//! Idle → Open → {Locked ⇄ Checking} → Locked → Closed → (reopen) Open
//! ```
//!
//! Transition guards fail before any mutation, so a rejected call leaves
//! the session exactly as it was.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::{DurationMs, MessageRef, Timestamp};

/// The five lifecycle states of an engagement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session has run in this group yet.
    Idle,
    /// The link-submission window is open.
    Open,
    /// Posting is frozen; data intact.
    Locked,
    /// The proof-checking window is open, with a live deadline.
    Checking,
    /// The session ended; session-scoped data cleared.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Open => "open",
            SessionState::Locked => "locked",
            SessionState::Checking => "checking",
            SessionState::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// Per-group session bookkeeping: lifecycle state plus the counters that
/// are scoped to a single open/close cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Current lifecycle state
    pub state: SessionState,
    /// When the current cycle was opened
    pub opened_at: Option<Timestamp>,
    /// Checking-phase deadline, set by [`Session::check`]
    pub deadline: Option<Timestamp>,
    /// Count of live link entries this cycle
    pub link_count: u32,
    /// Next re-review flag sequence number; strictly increasing, never reused
    pub sr_counter: u64,
    /// The currently pinned reminder message, if any
    pub pinned_reminder: Option<MessageRef>,
}

impl Session {
    /// A fresh session in `Idle`.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            opened_at: None,
            deadline: None,
            link_count: 0,
            sr_counter: 1,
            pinned_reminder: None,
        }
    }

    /// Open a new submission window.
    ///
    /// Legal from `Idle` or `Closed` only. Resets every cycle-scoped
    /// counter; the caller clears the registry and review queue alongside.
    pub fn open(&mut self, now: Timestamp) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Closed => {}
            from => return Err(SessionError::invalid_transition(from, "open")),
        }

        self.state = SessionState::Open;
        self.opened_at = Some(now);
        self.deadline = None;
        self.link_count = 0;
        self.sr_counter = 1;
        self.pinned_reminder = None;
        Ok(())
    }

    /// Freeze posting, leaving all data intact.
    ///
    /// Legal from `Open` or `Checking`.
    pub fn lock(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Open | SessionState::Checking => {}
            from => return Err(SessionError::invalid_transition(from, "lock")),
        }

        self.state = SessionState::Locked;
        Ok(())
    }

    /// Enter the proof-checking phase with a deadline of `now + window`.
    ///
    /// Legal from `Open`, or from `Locked` when an explicit lock
    /// interrupted the cycle (the `Locked ⇄ Checking` edge). A session
    /// that never opened cannot reach checking.
    pub fn check(&mut self, now: Timestamp, window: DurationMs) -> Result<Timestamp, SessionError> {
        match self.state {
            SessionState::Open | SessionState::Locked => {}
            from => return Err(SessionError::invalid_transition(from, "check")),
        }

        let deadline = now + window;
        self.state = SessionState::Checking;
        self.deadline = Some(deadline);
        Ok(deadline)
    }

    /// Close the session. Legal from any state.
    ///
    /// Resets every cycle-scoped field; the caller clears the registry,
    /// review queue, and temporary mutes alongside. Ban records survive.
    pub fn end(&mut self) {
        self.state = SessionState::Closed;
        self.opened_at = None;
        self.deadline = None;
        self.link_count = 0;
        self.sr_counter = 1;
        self.pinned_reminder = None;
    }

    /// Whether link submissions are currently accepted.
    pub fn accepts_links(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Whether proof submissions are currently accepted.
    pub fn accepts_proof(&self) -> bool {
        self.state == SessionState::Checking
    }

    /// Take the next re-review sequence number.
    pub fn next_sr_seq(&mut self) -> u64 {
        let seq = self.sr_counter;
        self.sr_counter += 1;
        seq
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
