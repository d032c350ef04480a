use actix_web::{delete, get, post, put, web};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{error, success},
    modules::{
        connection::{
            model::{
                ConnectionRequestBody, ConnectionResponse, PairQuery, PairStatusResponse,
                UserSearchQuery,
            },
            repository_pg::ConnectionRepositoryPg,
            service::ConnectionService,
        },
        user::{model::UserSummary, repository_pg::UserRepositoryPg},
    },
};

pub type ConnectionSvc = ConnectionService<ConnectionRepositoryPg, UserRepositoryPg>;

#[post("/request")]
pub async fn send_request(
    connection_service: web::Data<ConnectionSvc>,
    body: web::Json<ConnectionRequestBody>,
) -> Result<success::Success<ConnectionResponse>, error::Error> {
    let connection =
        connection_service.send_request(body.requester_id, body.receiver_id).await?;

    Ok(success::Success::created(Some(connection.into()))
        .message("Connection request sent successfully"))
}

#[put("/{id}/accept")]
pub async fn accept_request(
    connection_service: web::Data<ConnectionSvc>,
    id: web::Path<Uuid>,
) -> Result<success::Success<ConnectionResponse>, error::Error> {
    let connection = connection_service.accept_request(*id).await?;

    Ok(success::Success::ok(Some(connection.into()))
        .message("Connection request accepted successfully"))
}

#[put("/{id}/reject")]
pub async fn reject_request(
    connection_service: web::Data<ConnectionSvc>,
    id: web::Path<Uuid>,
) -> Result<success::Success<ConnectionResponse>, error::Error> {
    let connection = connection_service.reject_request(*id).await?;

    Ok(success::Success::ok(Some(connection.into()))
        .message("Connection request rejected successfully"))
}

#[put("/{id}/block")]
pub async fn block_connection(
    connection_service: web::Data<ConnectionSvc>,
    id: web::Path<Uuid>,
) -> Result<success::Success<ConnectionResponse>, error::Error> {
    let connection = connection_service.block_connection(*id).await?;

    Ok(success::Success::ok(Some(connection.into())).message("Connection blocked successfully"))
}

#[delete("/{id}")]
pub async fn remove_connection(
    connection_service: web::Data<ConnectionSvc>,
    id: web::Path<Uuid>,
) -> Result<success::Success<()>, error::Error> {
    connection_service.remove_connection(*id).await?;
    Ok(success::Success::no_content())
}

#[get("/user/{user_id}")]
pub async fn list_user_connections(
    connection_service: web::Data<ConnectionSvc>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<Vec<ConnectionResponse>>, error::Error> {
    let connections = connection_service.get_user_connections(*user_id).await?;

    Ok(success::Success::ok(Some(
        connections.into_iter().map(ConnectionResponse::from).collect(),
    )))
}

#[get("/user/{user_id}/friends")]
pub async fn list_friends(
    connection_service: web::Data<ConnectionSvc>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<Vec<ConnectionResponse>>, error::Error> {
    let friends = connection_service.get_friends(*user_id).await?;

    Ok(success::Success::ok(Some(friends.into_iter().map(ConnectionResponse::from).collect())))
}

#[get("/user/{user_id}/pending")]
pub async fn list_pending_received(
    connection_service: web::Data<ConnectionSvc>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<Vec<ConnectionResponse>>, error::Error> {
    let pending = connection_service.get_pending_received(*user_id).await?;

    Ok(success::Success::ok(Some(pending.into_iter().map(ConnectionResponse::from).collect())))
}

#[get("/user/{user_id}/sent")]
pub async fn list_pending_sent(
    connection_service: web::Data<ConnectionSvc>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<Vec<ConnectionResponse>>, error::Error> {
    let sent = connection_service.get_pending_sent(*user_id).await?;

    Ok(success::Success::ok(Some(sent.into_iter().map(ConnectionResponse::from).collect())))
}

#[get("/status")]
pub async fn pair_status(
    connection_service: web::Data<ConnectionSvc>,
    query: web::Query<PairQuery>,
) -> Result<success::Success<PairStatusResponse>, error::Error> {
    let status =
        connection_service.get_connection_status(query.requester_id, query.receiver_id).await?;

    Ok(success::Success::ok(Some(PairStatusResponse { status })))
}

#[get("/search")]
pub async fn search_users(
    connection_service: web::Data<ConnectionSvc>,
    query: web::Query<UserSearchQuery>,
) -> Result<success::Success<Vec<UserSummary>>, error::Error> {
    query.validate().map_err(|_| error::Error::bad_request("email must not be empty"))?;
    let users = connection_service.search_users(&query.email).await?;

    Ok(success::Success::ok(Some(users)))
}
