// src/main.rs

mod access;
mod app_state;
mod auth;
mod chat;
mod config;
mod db;
mod error;
mod models;
mod project;
mod resource;
mod routes;
mod store;
mod task;
mod team_management;
mod user_management;

#[cfg(test)]
mod test_support;

use std::io;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use crate::app_state::AppState;
use crate::auth::Authentication;
use crate::db::MongoDB;
use crate::store::mongo::MongoStore;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let mongodb = MongoDB::connect(&config.mongo_uri, &config.database_name)
        .await
        .map_err(|e| {
            error!("Failed to connect to MongoDB: {}", e);
            io::Error::new(io::ErrorKind::Other, e)
        })?;
    MongoStore::new(mongodb.db.clone())
        .ensure_indexes()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let state = AppState::with_mongo(&mongodb, config.clone());
    let frontend_origin = config.frontend_origin.clone();
    let jwt_secret = config.jwt_secret.clone();

    info!("Server running at http://{}", config.bind_address);
    info!("Allowed CORS Origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Authentication::new(jwt_secret.clone()))
            .wrap(cors)
            .wrap(Logger::new("%a \"%r\" %s %b %Dms \"%{User-Agent}i\""))
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    mongodb.shutdown().await;
    Ok(())
}
