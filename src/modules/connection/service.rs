use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        connection::{
            error::ConnectionError,
            repository::{ConnectionRepository, RequestOutcome, TransitionOutcome},
            schema::{ConnectionEntity, ConnectionStatus, RequestDenied},
        },
        user::{model::UserSummary, repository::UserRepository},
    },
};

#[derive(Clone)]
pub struct ConnectionService<R, U>
where
    R: ConnectionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    connection_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> ConnectionService<R, U>
where
    R: ConnectionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(connection_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        ConnectionService { connection_repo, user_repo }
    }

    pub async fn send_request(
        &self,
        requester_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<ConnectionEntity, ConnectionError> {
        if requester_id == receiver_id {
            return Err(ConnectionError::SelfConnection);
        }

        let (requester, receiver) = tokio::try_join!(
            self.user_repo.find_by_id(&requester_id),
            self.user_repo.find_by_id(&receiver_id),
        )?;
        if requester.is_none() {
            return Err(ConnectionError::NotFound("Requester user not found".into()));
        }
        if receiver.is_none() {
            return Err(ConnectionError::NotFound("Receiver user not found".into()));
        }

        let outcome = self
            .connection_repo
            .submit_request(&requester_id, &receiver_id)
            .await
            .map_err(|e| match e {
                error::SystemError::Conflict(_) => ConnectionError::Conflict,
                other => ConnectionError::Storage(other),
            })?;

        match outcome {
            RequestOutcome::Created(row) => {
                log::info!(
                    "Connection request {} created from user {} to user {}",
                    row.id,
                    requester_id,
                    receiver_id
                );
                Ok(row)
            }
            RequestOutcome::AutoAccepted(row) => {
                log::info!(
                    "Crossed requests between users {} and {} collapsed into connection {}",
                    requester_id,
                    receiver_id,
                    row.id
                );
                Ok(row)
            }
            RequestOutcome::Denied(reason) => Err(match reason {
                RequestDenied::AlreadyPending => ConnectionError::AlreadyPending,
                RequestDenied::AlreadyConnected => ConnectionError::AlreadyConnected,
                RequestDenied::Blocked => ConnectionError::Blocked,
                RequestDenied::BlockedByPeer => ConnectionError::BlockedByPeer,
            }),
        }
    }

    pub async fn accept_request(
        &self,
        connection_id: Uuid,
    ) -> Result<ConnectionEntity, ConnectionError> {
        self.review_request(connection_id, ConnectionStatus::Accepted).await
    }

    pub async fn reject_request(
        &self,
        connection_id: Uuid,
    ) -> Result<ConnectionEntity, ConnectionError> {
        self.review_request(connection_id, ConnectionStatus::Rejected).await
    }

    async fn review_request(
        &self,
        connection_id: Uuid,
        next: ConnectionStatus,
    ) -> Result<ConnectionEntity, ConnectionError> {
        match self.connection_repo.transition(&connection_id, next).await? {
            TransitionOutcome::Applied(row) => {
                log::info!("Connection {} moved to {}", connection_id, next);
                Ok(row)
            }
            TransitionOutcome::Missing => {
                Err(ConnectionError::NotFound("Connection not found".into()))
            }
            TransitionOutcome::InvalidFrom(from) => {
                Err(ConnectionError::InvalidTransition { from, to: next })
            }
        }
    }

    pub async fn block_connection(
        &self,
        connection_id: Uuid,
    ) -> Result<ConnectionEntity, ConnectionError> {
        match self.connection_repo.transition(&connection_id, ConnectionStatus::Blocked).await? {
            TransitionOutcome::Applied(row) => {
                log::info!("Connection {} blocked", connection_id);
                Ok(row)
            }
            TransitionOutcome::Missing => {
                Err(ConnectionError::NotFound("Connection not found".into()))
            }
            TransitionOutcome::InvalidFrom(from) => {
                Err(ConnectionError::InvalidTransition { from, to: ConnectionStatus::Blocked })
            }
        }
    }

    pub async fn remove_connection(&self, connection_id: Uuid) -> Result<(), ConnectionError> {
        if !self.connection_repo.delete(&connection_id).await? {
            return Err(ConnectionError::NotFound("Connection not found".into()));
        }
        log::info!("Connection {} removed", connection_id);
        Ok(())
    }

    pub async fn get_user_connections(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConnectionEntity>, ConnectionError> {
        self.require_user(&user_id).await?;
        Ok(self.connection_repo.find_for_user(&user_id).await?)
    }

    pub async fn get_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConnectionEntity>, ConnectionError> {
        self.require_user(&user_id).await?;
        Ok(self
            .connection_repo
            .find_for_user_by_status(&user_id, ConnectionStatus::Accepted)
            .await?)
    }

    pub async fn get_pending_received(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConnectionEntity>, ConnectionError> {
        self.require_user(&user_id).await?;
        Ok(self
            .connection_repo
            .find_received_by_status(&user_id, ConnectionStatus::Pending)
            .await?)
    }

    pub async fn get_pending_sent(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConnectionEntity>, ConnectionError> {
        self.require_user(&user_id).await?;
        Ok(self.connection_repo.find_sent_by_status(&user_id, ConnectionStatus::Pending).await?)
    }

    /// Lower-cased status of the pair, forward row first, `"none"` when no
    /// row exists in either direction.
    pub async fn get_connection_status(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<&'static str, ConnectionError> {
        let (a, b) = tokio::try_join!(
            self.user_repo.find_by_id(&user_a),
            self.user_repo.find_by_id(&user_b),
        )?;
        if a.is_none() || b.is_none() {
            return Err(ConnectionError::NotFound("User not found".into()));
        }

        let pair = self.connection_repo.find_pair(&user_a, &user_b).await?;
        Ok(pair.map(|c| c.status.as_str()).unwrap_or("none"))
    }

    pub async fn search_users(&self, email: &str) -> Result<Vec<UserSummary>, ConnectionError> {
        let users = self.user_repo.search_by_email(email, 20).await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }

    async fn require_user(&self, user_id: &Uuid) -> Result<(), ConnectionError> {
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(ConnectionError::NotFound("User not found".into()));
        }
        Ok(())
    }
}
