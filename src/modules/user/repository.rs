use uuid::Uuid;

use crate::{api::error, modules::user::schema::UserEntity};

/// Directory contract. The connection module only ever resolves ids and
/// searches by email; user storage itself lives elsewhere.
#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    /// Case-insensitive partial match on email.
    async fn search_by_email(
        &self,
        query: &str,
        limit: i32,
    ) -> Result<Vec<UserEntity>, error::SystemError>;
}
