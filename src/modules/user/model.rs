use serde::Serialize;
use uuid::Uuid;

use crate::modules::user::schema::UserEntity;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<UserEntity> for UserSummary {
    fn from(user: UserEntity) -> Self {
        UserSummary {
            id: user.id,
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            email: user.email,
        }
    }
}
