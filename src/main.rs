use actix_web::{self, middleware::Logger, web, App, HttpServer};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::connect_database,
    modules::{
        connection::{repository_pg::ConnectionRepositoryPg, service::ConnectionService},
        user::repository_pg::UserRepositoryPg,
    },
};

mod api;
mod configs;
mod constants;
mod modules;
#[cfg(test)]
mod test;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let user_repo = UserRepositoryPg::new(db_pool.clone());
    let connection_repo = ConnectionRepositoryPg::new(db_pool.clone());

    let connection_service =
        ConnectionService::with_dependencies(Arc::new(connection_repo), Arc::new(user_repo));

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(connection_service.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .service(health_check)
            .service(web::scope("/api").configure(modules::connection::route::configure))
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
