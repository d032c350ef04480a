use uuid::Uuid;

use crate::{
    api::error,
    modules::connection::{
        repository::{ConnectionRepository, RequestOutcome, TransitionOutcome},
        schema::{decide_request, ConnectionEntity, ConnectionStatus, RequestDecision},
    },
};

#[derive(Clone)]
pub struct ConnectionRepositoryPg {
    pool: sqlx::PgPool,
}

impl ConnectionRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConnectionRepository for ConnectionRepositoryPg {
    async fn submit_request(
        &self,
        requester_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<RequestOutcome, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // Rival submits for the same unordered pair queue up on this lock,
        // so each transaction sees the other's committed row. The ordered
        // uniqueness constraint alone cannot stop one forward plus one
        // reverse insert.
        let (lock_a, lock_b) = if requester_id <= receiver_id {
            (requester_id, receiver_id)
        } else {
            (receiver_id, requester_id)
        };
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))")
            .bind(lock_a)
            .bind(lock_b)
            .execute(&mut *tx)
            .await?;

        let forward = sqlx::query_as::<_, ConnectionEntity>(
            "SELECT * FROM connections WHERE requester_id = $1 AND receiver_id = $2 FOR UPDATE",
        )
        .bind(requester_id)
        .bind(receiver_id)
        .fetch_optional(&mut *tx)
        .await?;

        let reverse = sqlx::query_as::<_, ConnectionEntity>(
            "SELECT * FROM connections WHERE requester_id = $1 AND receiver_id = $2 FOR UPDATE",
        )
        .bind(receiver_id)
        .bind(requester_id)
        .fetch_optional(&mut *tx)
        .await?;

        match decide_request(forward.map(|c| c.status), reverse.as_ref().map(|c| c.status)) {
            RequestDecision::Deny(reason) => {
                tx.rollback().await?;
                Ok(RequestOutcome::Denied(reason))
            }
            RequestDecision::AcceptReverse => {
                let Some(row) = reverse else {
                    tx.rollback().await?;
                    return Err(error::SystemError::DatabaseError(
                        "pair state changed mid-transaction".into(),
                    ));
                };
                let updated = sqlx::query_as::<_, ConnectionEntity>(
                    "UPDATE connections SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
                )
                .bind(row.id)
                .bind(ConnectionStatus::Accepted)
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok(RequestOutcome::AutoAccepted(updated))
            }
            RequestDecision::Create => {
                let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
                let created = sqlx::query_as::<_, ConnectionEntity>(
                    r#"
                    INSERT INTO connections (id, requester_id, receiver_id, status)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(requester_id)
                .bind(receiver_id)
                .bind(ConnectionStatus::Pending)
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok(RequestOutcome::Created(created))
            }
        }
    }

    async fn transition(
        &self,
        id: &Uuid,
        next: ConnectionStatus,
    ) -> Result<TransitionOutcome, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ConnectionEntity>(
            "SELECT * FROM connections WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(TransitionOutcome::Missing);
        };

        if !current.status.permits(next) {
            tx.rollback().await?;
            return Ok(TransitionOutcome::InvalidFrom(current.status));
        }

        let updated = sqlx::query_as::<_, ConnectionEntity>(
            "UPDATE connections SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(TransitionOutcome::Applied(updated))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM connections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    async fn find_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let connections = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            SELECT * FROM connections
            WHERE requester_id = $1 OR receiver_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(connections)
    }

    async fn find_for_user_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let connections = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            SELECT * FROM connections
            WHERE (requester_id = $1 OR receiver_id = $1) AND status = $2
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(connections)
    }

    async fn find_received_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let connections = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            SELECT * FROM connections
            WHERE receiver_id = $1 AND status = $2
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(connections)
    }

    async fn find_sent_by_status(
        &self,
        user_id: &Uuid,
        status: ConnectionStatus,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let connections = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            SELECT * FROM connections
            WHERE requester_id = $1 AND status = $2
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(connections)
    }

    async fn find_pair(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError> {
        let connection = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            SELECT * FROM connections
            WHERE (requester_id = $1 AND receiver_id = $2)
               OR (requester_id = $2 AND receiver_id = $1)
            ORDER BY (requester_id = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(connection)
    }
}
