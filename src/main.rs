use std::sync::Arc;

use actix_web::{middleware::{from_fn, Logger}, web, App, HttpServer};
use config::AppConfig;
use dotenv::dotenv;
use errors::StartupError;
use middlewares::envelope::envelope_middleware;
use models::{PgStore, Store};
use sqlx::postgres::PgPoolOptions;
use storage::FileStorage;
use tracing::info;
use utils::JwtService;

mod config;
mod errors;
mod handlers;
mod middlewares;
mod models;
mod schema;
mod storage;
mod telemetry;
mod utils;

#[cfg(test)]
mod test_init_app;

pub struct GlobalState{
    pub store: Arc<dyn Store>,
    pub jwt: JwtService,
    pub storage: FileStorage,
}

#[actix_web::main]
async fn main() -> Result<(), StartupError> {

    dotenv().ok();

    let config = AppConfig::from_env()?;
    telemetry::init_tracing(config.log_format);

    let pool = PgPoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect(&config.database_url)
    .await
    .map_err(StartupError::DbConnect)?;

    let storage = FileStorage::init(&config.upload_dir).map_err(StartupError::Storage)?;

    let global_state = GlobalState{
        store: Arc::new(PgStore::new(pool)),
        jwt: JwtService::new(&config.jwt_secret, config.jwt_expiration_secs),
        storage,
    };

    let app_data = web::Data::new(global_state);
    let json_limit = config.max_upload_bytes;
    let address = config.address();

    info!(%address, "The Server is running");

    HttpServer::new(
        move||{
            App::new()
            .wrap(from_fn(envelope_middleware))
            .wrap(Logger::default())
            .configure(|cfg| handlers::configure(cfg, app_data.clone(), json_limit))
        }
    ).bind(&address)
    .map_err(StartupError::SocketBind)?
    .run()
    .await
    .map_err(StartupError::ServerStart)?;

    Ok(())

}
