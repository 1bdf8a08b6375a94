use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::store::traits::ProductStore;

pub fn create_router<S: ProductStore + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route(
            "/products",
            get(handlers::list_products::<S>).post(handlers::create_product::<S>),
        )
        .route(
            "/products/:id",
            put(handlers::update_product::<S>).delete(handlers::delete_product::<S>),
        )
}
