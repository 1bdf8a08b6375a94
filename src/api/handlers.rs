use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::model::{NewProduct, Product, ProductId, ProductSummary, ProductUpdate};
use crate::store::traits::ProductStore;

pub type AppState<S> = Arc<S>;

const CREATE_FAILED: &str = "An error occurred while creating the product and properties.";
const LIST_FAILED: &str = "An error occurred while fetching products.";
const UPDATE_FAILED: &str = "An error occurred while updating the product.";
const DELETE_FAILED: &str = "An error occurred while deleting the product.";
const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Body of a successful `POST /products`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductSummary>,
}

pub async fn create_product<S: ProductStore>(
    State(store): State<AppState<S>>,
    RequestJson(new_product): RequestJson<NewProduct>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let product_id = store
        .create_product(new_product)
        .await
        .map_err(ApiError::persistence(CREATE_FAILED))?;

    log::info!("Created product {}", product_id);

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Product and properties created successfully".to_string(),
            id: product_id,
        }),
    ))
}

pub async fn list_products<S: ProductStore>(
    State(store): State<AppState<S>>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = store
        .list_products()
        .await
        .map_err(ApiError::persistence(LIST_FAILED))?;

    Ok(Json(ProductListResponse { products }))
}

pub async fn update_product<S: ProductStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<ProductId>,
    RequestJson(update): RequestJson<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    match store.update_product(id, update).await {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => Err(ApiError::NotFound(PRODUCT_NOT_FOUND)),
        Err(e) => Err(ApiError::persistence(UPDATE_FAILED)(e)),
    }
}

pub async fn delete_product<S: ProductStore>(
    State(store): State<AppState<S>>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>, ApiError> {
    match store.delete_product(id).await {
        Ok(true) => {
            log::info!("Deleted product {}", id);
            Ok(Json(MessageResponse::new("Product deleted successfully")))
        }
        Ok(false) => Err(ApiError::NotFound(PRODUCT_NOT_FOUND)),
        Err(e) => Err(ApiError::persistence(DELETE_FAILED)(e)),
    }
}
