use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

use credit_approval_rs::config::Config;
use credit_approval_rs::http;
use credit_approval_rs::service::ApprovalService;
use credit_approval_rs::store::postgres::PgStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    let service = web::Data::new(ApprovalService::new(
        store,
        SafeTimeProvider::new(TimeSource::System),
    ));

    let address = config.server_address();
    info!("starting credit approval service on {address}");
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .configure(http::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
