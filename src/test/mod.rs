use std::sync::Arc;

use uuid::Uuid;

use crate::api::error;
use crate::modules::connection::error::ConnectionError;
use crate::modules::connection::repository_mem::ConnectionRepositoryMem;
use crate::modules::connection::schema::ConnectionStatus;
use crate::modules::connection::service::ConnectionService;
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserEntity;

struct UserDirectoryMem {
    users: Vec<UserEntity>,
}

impl UserDirectoryMem {
    fn with_ids(ids: &[Uuid]) -> Self {
        let users = ids
            .iter()
            .map(|id| UserEntity {
                id: *id,
                first_name: Some("Test".to_string()),
                last_name: None,
                email: format!("{id}@example.com"),
                created_at: chrono::Utc::now(),
            })
            .collect();
        Self { users }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserDirectoryMem {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.iter().find(|u| u.id == *id).cloned())
    }

    async fn search_by_email(
        &self,
        query: &str,
        limit: i32,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let needle = query.to_lowercase();
        Ok(self
            .users
            .iter()
            .filter(|u| u.email.to_lowercase().contains(&needle))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

type TestService = ConnectionService<ConnectionRepositoryMem, UserDirectoryMem>;

fn new_user() -> Uuid {
    Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
}

fn service_for(ids: &[Uuid]) -> (TestService, Arc<ConnectionRepositoryMem>) {
    let repo = Arc::new(ConnectionRepositoryMem::new());
    let directory = Arc::new(UserDirectoryMem::with_ids(ids));
    (ConnectionService::with_dependencies(Arc::clone(&repo), directory), repo)
}

#[actix_web::test]
async fn request_creates_single_pending_row() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    let connection = service.send_request(a, b).await.unwrap();

    assert_eq!(connection.requester_id, a);
    assert_eq!(connection.receiver_id, b);
    assert_eq!(connection.status, ConnectionStatus::Pending);
    assert_eq!(connection.created_at, connection.updated_at);
    assert_eq!(repo.row_count().await, 1);

    // The pair reads the same in both directions.
    assert_eq!(service.get_connection_status(a, b).await.unwrap(), "pending");
    assert_eq!(service.get_connection_status(b, a).await.unwrap(), "pending");
    assert_eq!(service.get_pending_sent(a).await.unwrap().len(), 1);
    assert_eq!(service.get_pending_received(b).await.unwrap().len(), 1);
    assert!(service.get_pending_received(a).await.unwrap().is_empty());
}

#[actix_web::test]
async fn request_to_self_is_rejected() {
    let a = new_user();
    let (service, repo) = service_for(&[a]);

    let err = service.send_request(a, a).await.unwrap_err();
    assert!(matches!(err, ConnectionError::SelfConnection));
    assert_eq!(repo.row_count().await, 0);
}

#[actix_web::test]
async fn request_requires_known_users() {
    let (a, b) = (new_user(), new_user());
    let stranger = new_user();
    let (service, repo) = service_for(&[a, b]);

    let err = service.send_request(a, stranger).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));

    let err = service.send_request(stranger, b).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));

    assert_eq!(repo.row_count().await, 0);
}

#[actix_web::test]
async fn duplicate_request_reports_already_pending() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    service.send_request(a, b).await.unwrap();
    let err = service.send_request(a, b).await.unwrap_err();

    assert!(matches!(err, ConnectionError::AlreadyPending));
    assert_eq!(repo.row_count().await, 1);
}

#[actix_web::test]
async fn crossed_requests_collapse_into_one_accepted_row() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    let first = service.send_request(a, b).await.unwrap();
    let second = service.send_request(b, a).await.unwrap();

    // The existing row flipped, no second row was created.
    assert_eq!(second.id, first.id);
    assert_eq!(second.requester_id, a);
    assert_eq!(second.receiver_id, b);
    assert_eq!(second.status, ConnectionStatus::Accepted);
    assert_eq!(repo.row_count().await, 1);

    let friends_of_a = service.get_friends(a).await.unwrap();
    let friends_of_b = service.get_friends(b).await.unwrap();
    assert_eq!(friends_of_a.len(), 1);
    assert_eq!(friends_of_b.len(), 1);
    assert_eq!(friends_of_a[0].id, first.id);
}

#[actix_web::test]
async fn accept_flow_end_to_end() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    let pending = service.send_request(a, b).await.unwrap();
    let accepted = service.accept_request(pending.id).await.unwrap();

    assert_eq!(accepted.status, ConnectionStatus::Accepted);
    assert!(accepted.updated_at >= accepted.created_at);
    assert_eq!(service.get_friends(a).await.unwrap().len(), 1);
    assert_eq!(service.get_friends(b).await.unwrap().len(), 1);
    assert!(service.get_pending_received(b).await.unwrap().is_empty());

    service.remove_connection(accepted.id).await.unwrap();
    assert_eq!(service.get_connection_status(a, b).await.unwrap(), "none");
    assert!(service.get_user_connections(a).await.unwrap().is_empty());
    assert!(service.get_user_connections(b).await.unwrap().is_empty());
    assert_eq!(repo.row_count().await, 0);
}

#[actix_web::test]
async fn review_requires_a_pending_row() {
    let (a, b) = (new_user(), new_user());
    let (service, _repo) = service_for(&[a, b]);

    let pending = service.send_request(a, b).await.unwrap();
    service.accept_request(pending.id).await.unwrap();

    let err = service.accept_request(pending.id).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::InvalidTransition { from: ConnectionStatus::Accepted, .. }
    ));

    let err = service.reject_request(pending.id).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::InvalidTransition { from: ConnectionStatus::Accepted, .. }
    ));

    let err = service.accept_request(new_user()).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));
}

#[actix_web::test]
async fn reject_closes_the_request() {
    let (a, b) = (new_user(), new_user());
    let (service, _repo) = service_for(&[a, b]);

    let pending = service.send_request(a, b).await.unwrap();
    let rejected = service.reject_request(pending.id).await.unwrap();

    assert_eq!(rejected.status, ConnectionStatus::Rejected);
    assert_eq!(service.get_connection_status(a, b).await.unwrap(), "rejected");
    assert!(service.get_pending_sent(a).await.unwrap().is_empty());
    assert!(service.get_pending_received(b).await.unwrap().is_empty());
    assert!(service.get_friends(a).await.unwrap().is_empty());
}

#[actix_web::test]
async fn resend_after_rejection_conflicts_until_removed() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    let pending = service.send_request(a, b).await.unwrap();
    service.reject_request(pending.id).await.unwrap();

    // The rejected row still occupies the ordered slot.
    let err = service.send_request(a, b).await.unwrap_err();
    assert!(matches!(err, ConnectionError::Conflict));
    assert_eq!(repo.row_count().await, 1);

    // The other direction is free.
    let fresh = service.send_request(b, a).await.unwrap();
    assert_eq!(fresh.status, ConnectionStatus::Pending);
    assert_eq!(fresh.requester_id, b);
    assert_eq!(repo.row_count().await, 2);

    // Removing the stale row frees the slot again.
    service.remove_connection(fresh.id).await.unwrap();
    service.remove_connection(pending.id).await.unwrap();
    let retried = service.send_request(a, b).await.unwrap();
    assert_eq!(retried.status, ConnectionStatus::Pending);
}

#[actix_web::test]
async fn block_wins_from_any_state_and_is_idempotent() {
    let (a, b) = (new_user(), new_user());
    let (service, _repo) = service_for(&[a, b]);

    let pending = service.send_request(a, b).await.unwrap();
    let blocked = service.block_connection(pending.id).await.unwrap();
    assert_eq!(blocked.status, ConnectionStatus::Blocked);

    // Blocking an already blocked row is allowed.
    let again = service.block_connection(pending.id).await.unwrap();
    assert_eq!(again.status, ConnectionStatus::Blocked);

    let err = service.block_connection(new_user()).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));
}

#[actix_web::test]
async fn blocked_pair_refuses_requests_in_both_directions() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    let pending = service.send_request(a, b).await.unwrap();
    service.block_connection(pending.id).await.unwrap();
    assert_eq!(service.get_connection_status(a, b).await.unwrap(), "blocked");

    // The blocked row is the reverse edge from b's point of view.
    let err = service.send_request(b, a).await.unwrap_err();
    assert!(matches!(err, ConnectionError::BlockedByPeer));

    let err = service.send_request(a, b).await.unwrap_err();
    assert!(matches!(err, ConnectionError::Blocked));

    assert_eq!(repo.row_count().await, 1);
}

#[actix_web::test]
async fn removing_a_blocked_row_clears_all_history() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    let pending = service.send_request(a, b).await.unwrap();
    service.block_connection(pending.id).await.unwrap();
    service.remove_connection(pending.id).await.unwrap();

    assert_eq!(service.get_connection_status(a, b).await.unwrap(), "none");
    assert_eq!(repo.row_count().await, 0);

    // A fresh request behaves as if the pair had no prior relationship.
    let fresh = service.send_request(b, a).await.unwrap();
    assert_eq!(fresh.status, ConnectionStatus::Pending);

    let err = service.remove_connection(pending.id).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));
}

#[actix_web::test]
async fn concurrent_opposite_requests_leave_exactly_one_row() {
    let (a, b) = (new_user(), new_user());
    let (service, repo) = service_for(&[a, b]);

    let (first, second) = tokio::join!(service.send_request(a, b), service.send_request(b, a));

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(repo.row_count().await, 1);
    assert_eq!(first.id, second.id);
    assert_eq!(second.status, ConnectionStatus::Accepted);
    assert_eq!(service.get_friends(a).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn connections_are_listed_newest_updated_first() {
    let (a, b, c) = (new_user(), new_user(), new_user());
    let (service, _repo) = service_for(&[a, b, c]);

    let to_b = service.send_request(a, b).await.unwrap();
    let to_c = service.send_request(a, c).await.unwrap();

    let listed = service.get_user_connections(a).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, to_c.id);
    assert_eq!(listed[1].id, to_b.id);

    // Accepting the older request makes it the most recently updated.
    service.accept_request(to_b.id).await.unwrap();
    let listed = service.get_user_connections(a).await.unwrap();
    assert_eq!(listed[0].id, to_b.id);
    assert_eq!(listed[1].id, to_c.id);
}

#[actix_web::test]
async fn queries_require_a_known_user() {
    let a = new_user();
    let (service, _repo) = service_for(&[a]);

    let err = service.get_user_connections(new_user()).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));

    let err = service.get_connection_status(a, new_user()).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound(_)));
}

#[actix_web::test]
async fn search_matches_email_fragments() {
    let (a, b) = (new_user(), new_user());
    let (service, _repo) = service_for(&[a, b]);

    let everyone = service.search_users("example.com").await.unwrap();
    assert_eq!(everyone.len(), 2);

    let just_a = service.search_users(&a.to_string()).await.unwrap();
    assert_eq!(just_a.len(), 1);
    assert_eq!(just_a[0].id, a);

    assert!(service.search_users("nobody@nowhere").await.unwrap().is_empty());
}
