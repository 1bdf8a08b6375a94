use axum::serve;
use product_catalog::config::AppConfig;
use product_catalog::store::PostgresStore;
use product_catalog::{build_app, shutdown_signal};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}, allowed origin={}",
        config.server.host,
        config.server.port,
        config.cors.allowed_origin
    );

    log::info!("Connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let postgres_store = PostgresStore::connect(&database_url, &config.database).await?;

    if config.database.ensure_schema {
        log::info!("Ensuring product schema exists...");
        postgres_store.ensure_schema().await?;
    }

    let store = Arc::new(postgres_store);

    run_server(build_app(store.clone(), &config)?, &config).await?;

    log::info!("Closing connection pool");
    store.close().await;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Product catalog server running on http://{}", bind_address);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
