use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "connection_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
    Blocked,
}

impl ConnectionStatus {
    /// Lower-cased label, as reported by the pair status lookup.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Rejected => "rejected",
            ConnectionStatus::Blocked => "blocked",
        }
    }

    /// Only pending rows can be accepted or rejected; blocking wins from any
    /// state. Nothing ever moves back to pending.
    pub fn permits(self, next: ConnectionStatus) -> bool {
        match next {
            ConnectionStatus::Blocked => true,
            ConnectionStatus::Accepted | ConnectionStatus::Rejected => {
                self == ConnectionStatus::Pending
            }
            ConnectionStatus::Pending => false,
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed edge between two distinct users. Uniqueness on the ordered
/// pair `(requester_id, receiver_id)` is enforced by the store.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConnectionEntity {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub status: ConnectionStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// No usable row in either direction, insert a fresh pending edge.
    Create,
    /// The receiver already asked first, flip their pending row to accepted.
    AcceptReverse,
    Deny(RequestDenied),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDenied {
    AlreadyPending,
    AlreadyConnected,
    Blocked,
    BlockedByPeer,
}

/// What a submitted request should do to the store, given the statuses of
/// the forward `(requester -> receiver)` and reverse `(receiver -> requester)`
/// rows. Both store implementations run this inside their atomic section so
/// the two lookups and the write cannot be interleaved with a rival submit.
///
/// A forward row left in `Rejected` falls through to `Create` and collides
/// with the ordered-pair uniqueness constraint; the slot frees up only once
/// that row is removed.
pub fn decide_request(
    forward: Option<ConnectionStatus>,
    reverse: Option<ConnectionStatus>,
) -> RequestDecision {
    match forward {
        Some(ConnectionStatus::Pending) => {
            return RequestDecision::Deny(RequestDenied::AlreadyPending)
        }
        Some(ConnectionStatus::Accepted) => {
            return RequestDecision::Deny(RequestDenied::AlreadyConnected)
        }
        Some(ConnectionStatus::Blocked) => return RequestDecision::Deny(RequestDenied::Blocked),
        Some(ConnectionStatus::Rejected) | None => {}
    }

    match reverse {
        Some(ConnectionStatus::Pending) => RequestDecision::AcceptReverse,
        // An accepted reverse row already carries the relationship; creating a
        // forward pending row next to it would give the pair two live edges.
        Some(ConnectionStatus::Accepted) => RequestDecision::Deny(RequestDenied::AlreadyConnected),
        Some(ConnectionStatus::Blocked) => RequestDecision::Deny(RequestDenied::BlockedByPeer),
        Some(ConnectionStatus::Rejected) | None => RequestDecision::Create,
    }
}
