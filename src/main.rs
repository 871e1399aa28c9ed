mod api;
mod auth;
mod config;
mod error;
mod friendship;
mod identity;
mod model;
mod schema;
mod state;
mod store;
mod token;

use std::sync::Arc;

use actix::Actor;
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use diesel::{r2d2, r2d2::ConnectionManager, PgConnection};
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::stream::LiveServer;
use config::Config;
use error::AppError;
use identity::LocalIdentityGateway;
use state::AppState;
use store::PgStore;
use token::TokenService;

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .build(manager)
        .expect("Failed to create pool.");

    let store = Arc::new(PgStore::new(pool.clone()));
    let state = web::Data::new(AppState {
        tokens: TokenService::new(config.jwt_secret.as_bytes(), config.jwt_expires),
        users: store.clone(),
        friendships: store,
        identity: Arc::new(LocalIdentityGateway::new(pool.clone())),
    });
    let pool = web::Data::new(pool);
    let live = web::Data::new(LiveServer::new().start());
    let cors_origins = config.cors_origins.clone();

    info!(address = %config.bind_address, port = config.port, "server starting");
    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(state.clone())
            .app_data(live.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .wrap(api::cors(&cors_origins))
            .wrap(middleware::Logger::default())
            .configure(api::config)
            .route("/", web::get().to(|| async { HttpResponse::Ok().body("API Running") }))
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
