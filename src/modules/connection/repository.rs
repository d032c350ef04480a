use uuid::Uuid;

use crate::api::error;
use crate::modules::connection::schema::{ConnectionEntity, ConnectionStatus, RequestDenied};

/// Result of an atomic submit: a row was written, or the store refused with
/// the reason derived from the pair's existing rows.
#[derive(Debug)]
pub enum RequestOutcome {
    Created(ConnectionEntity),
    AutoAccepted(ConnectionEntity),
    Denied(RequestDenied),
}

#[derive(Debug)]
pub enum TransitionOutcome {
    Applied(ConnectionEntity),
    Missing,
    InvalidFrom(ConnectionStatus),
}

#[async_trait::async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Forward lookup, reverse lookup and create-or-flip as one atomic unit
    /// per unordered user pair. Two rival submits for the same pair must
    /// serialize: the loser sees the winner's row, never a duplicate.
    async fn submit_request(
        &self,
        requester_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<RequestOutcome, error::SystemError>;

    /// Single-row read-modify-write. Applies `next` and refreshes
    /// `updated_at` when the current status permits it.
    async fn transition(
        &self,
        id: &Uuid,
        next: ConnectionStatus,
    ) -> Result<TransitionOutcome, error::SystemError>;

    /// Hard delete. Returns false when no such row existed.
    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;

    async fn find_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError>;

    async fn find_for_user_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError>;

    async fn find_received_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError>;

    async fn find_sent_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError>;

    /// Forward row first, reverse row as fallback.
    async fn find_pair(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError>;
}
