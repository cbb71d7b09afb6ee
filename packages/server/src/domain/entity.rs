//! Domain entities.

use katagami_shared::protocol::UserIdentity;

use super::value_object::{ConnectionId, RoomName};

/// Outcome of one liveness check on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessCheck {
    /// The peer answered the previous probe; a new probe must be sent.
    Probe,
    /// No answer since the previous probe; the peer must be dropped.
    Unresponsive,
}

/// One authenticated live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub identity: UserIdentity,
    pub room: RoomName,
    /// Cleared when a probe is sent, set again when the peer acknowledges it.
    pub is_alive: bool,
    /// Unix timestamp (milliseconds)
    pub connected_at: i64,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        identity: UserIdentity,
        room: RoomName,
        connected_at: i64,
    ) -> Self {
        Self {
            id,
            identity,
            room,
            is_alive: true,
            connected_at,
        }
    }

    /// Run the heartbeat rule: a live connection is marked pending and probed,
    /// a connection still pending from the previous check is unresponsive.
    pub fn check_liveness(&mut self) -> LivenessCheck {
        if !self.is_alive {
            return LivenessCheck::Unresponsive;
        }
        self.is_alive = false;
        LivenessCheck::Probe
    }

    /// Record a probe acknowledgment.
    pub fn mark_alive(&mut self) {
        self.is_alive = true;
    }
}
