use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::connection::schema::{ConnectionEntity, ConnectionStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequestBody {
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairQuery {
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserSearchQuery {
    #[validate(length(min = 1))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub status: ConnectionStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ConnectionEntity> for ConnectionResponse {
    fn from(connection: ConnectionEntity) -> Self {
        ConnectionResponse {
            id: connection.id,
            requester_id: connection.requester_id,
            receiver_id: connection.receiver_id,
            status: connection.status,
            created_at: connection.created_at,
            updated_at: connection.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PairStatusResponse {
    pub status: &'static str,
}
