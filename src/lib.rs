pub mod api;
pub mod config;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, ProductStore};

use std::sync::Arc;

/// Router with state and origin policy applied, ready to serve
pub fn build_app<S: ProductStore + 'static>(
    store: Arc<S>,
    config: &config::AppConfig,
) -> anyhow::Result<axum::Router> {
    let router = api::routes::create_router().with_state(store);
    api::cors::apply_cors(router, &config.cors)
}

/// Resolves on Ctrl-C so in-flight requests can finish before the pool closes
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
