//! Session domain types: roles, the per-connection record, and the one-way
//! lifecycle state machine.
//!
//! Exactly one session owns a connection at a time.  Once a session leaves
//! `Active` it can only move forward – a stopping session never becomes
//! active again; the peers reconnect and start a fresh session instead.

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use uuid::Uuid;

/// Which side of the control relationship this peer plays for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Captures local input, displays the remote screen.
    Controller,
    /// Injects received input, streams its screen back.
    Controlled,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Controller => f.write_str("controller"),
            Role::Controlled => f.write_str("controlled"),
        }
    }
}

/// Lifecycle states of a session.
///
/// ```text
/// Connected ──handshake──▶ Active ──hotkey / EOF / error──▶ Stopping ──▶ Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket established, handshake not yet complete.
    Connected,
    /// Input and frames are flowing.
    Active,
    /// Wind-down in progress; tasks are draining and handles closing.
    Stopping,
    /// All resources released.
    Terminated,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connected, Active)
                | (Connected, Stopping)
                | (Active, Stopping)
                | (Stopping, Terminated)
        )
    }
}

/// One control session bound to one connection.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub role: Role,
    pub peer_addr: SocketAddr,
    pub started_at: Instant,
    state: SessionState,
}

impl Session {
    /// Creates a freshly connected session record.
    pub fn new(role: Role, peer_addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            peer_addr,
            started_at: Instant::now(),
            state: SessionState::Connected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Advances the lifecycle, ignoring illegal backward or repeated moves.
    ///
    /// Returns `true` when the transition was applied.  Idempotent stop
    /// requests (error path racing the hotkey path) are the common caller.
    pub fn advance(&mut self, next: SessionState) -> bool {
        if self.state.can_advance_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
