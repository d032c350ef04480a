use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    api::error,
    modules::connection::{
        repository::{ConnectionRepository, RequestOutcome, TransitionOutcome},
        schema::{decide_request, ConnectionEntity, ConnectionStatus, RequestDecision},
    },
};

/// Hash-map backed store with the same atomicity contract as the Postgres
/// repository: every operation runs under a single lock acquisition, so a
/// submit cannot interleave with a rival submit for the same pair.
#[derive(Default)]
pub struct ConnectionRepositoryMem {
    rows: Mutex<HashMap<Uuid, ConnectionEntity>>,
}

impl ConnectionRepositoryMem {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

fn newest_first(mut rows: Vec<ConnectionEntity>) -> Vec<ConnectionEntity> {
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    rows
}

#[async_trait::async_trait]
impl ConnectionRepository for ConnectionRepositoryMem {
    async fn submit_request(
        &self,
        requester_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<RequestOutcome, error::SystemError> {
        let mut rows = self.rows.lock().await;

        let forward = rows
            .values()
            .find(|c| c.requester_id == *requester_id && c.receiver_id == *receiver_id)
            .cloned();
        let reverse = rows
            .values()
            .find(|c| c.requester_id == *receiver_id && c.receiver_id == *requester_id)
            .cloned();

        match decide_request(
            forward.as_ref().map(|c| c.status),
            reverse.as_ref().map(|c| c.status),
        ) {
            RequestDecision::Deny(reason) => Ok(RequestOutcome::Denied(reason)),
            RequestDecision::AcceptReverse => {
                let Some(rev) = reverse else {
                    return Err(error::SystemError::DatabaseError(
                        "pair state changed mid-update".into(),
                    ));
                };
                let row = rows
                    .get_mut(&rev.id)
                    .ok_or_else(|| error::SystemError::DatabaseError("row vanished".into()))?;
                row.status = ConnectionStatus::Accepted;
                row.updated_at = chrono::Utc::now();
                Ok(RequestOutcome::AutoAccepted(row.clone()))
            }
            RequestDecision::Create => {
                // A leftover rejected forward row still occupies the ordered
                // slot, exactly like the uniqueness constraint in Postgres.
                if forward.is_some() {
                    return Err(error::SystemError::Conflict(None));
                }
                let now = chrono::Utc::now();
                let entity = ConnectionEntity {
                    id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
                    requester_id: *requester_id,
                    receiver_id: *receiver_id,
                    status: ConnectionStatus::Pending,
                    created_at: now,
                    updated_at: now,
                };
                rows.insert(entity.id, entity.clone());
                Ok(RequestOutcome::Created(entity))
            }
        }
    }

    async fn transition(
        &self,
        id: &Uuid,
        next: ConnectionStatus,
    ) -> Result<TransitionOutcome, error::SystemError> {
        let mut rows = self.rows.lock().await;

        let Some(row) = rows.get_mut(id) else {
            return Ok(TransitionOutcome::Missing);
        };

        if !row.status.permits(next) {
            return Ok(TransitionOutcome::InvalidFrom(row.status));
        }

        row.status = next;
        row.updated_at = chrono::Utc::now();
        Ok(TransitionOutcome::Applied(row.clone()))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.rows.lock().await.remove(id).is_some())
    }

    async fn find_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let rows = self.rows.lock().await;
        Ok(newest_first(
            rows.values()
                .filter(|c| c.requester_id == *user_id || c.receiver_id == *user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_for_user_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let rows = self.rows.lock().await;
        Ok(newest_first(
            rows.values()
                .filter(|c| {
                    (c.requester_id == *user_id || c.receiver_id == *user_id)
                        && c.status == status
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_received_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let rows = self.rows.lock().await;
        Ok(newest_first(
            rows.values()
                .filter(|c| c.receiver_id == *user_id && c.status == status)
                .cloned()
                .collect(),
        ))
    }

    async fn find_sent_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let rows = self.rows.lock().await;
        Ok(newest_first(
            rows.values()
                .filter(|c| c.requester_id == *user_id && c.status == status)
                .cloned()
                .collect(),
        ))
    }

    async fn find_pair(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError> {
        let rows = self.rows.lock().await;
        let forward = rows
            .values()
            .find(|c| c.requester_id == *user_a && c.receiver_id == *user_b)
            .cloned();
        if forward.is_some() {
            return Ok(forward);
        }
        Ok(rows
            .values()
            .find(|c| c.requester_id == *user_b && c.receiver_id == *user_a)
            .cloned())
    }
}
