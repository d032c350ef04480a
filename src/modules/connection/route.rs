use crate::modules::connection::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/connections")
            .service(send_request)
            .service(accept_request)
            .service(reject_request)
            .service(block_connection)
            .service(remove_connection)
            .service(list_user_connections)
            .service(list_friends)
            .service(list_pending_received)
            .service(list_pending_sent)
            .service(pair_status)
            .service(search_users),
    );
}
