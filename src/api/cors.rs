use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::error::ApiError;
use crate::config::CorsConfig;

/// Restrict the router to requests from the configured origin.
///
/// Requests without an `Origin` header pass through untouched. Any other
/// origin is answered with 403 before a handler runs; the `CorsLayer` only
/// decorates the responses the allowed origin gets.
pub fn apply_cors<S>(router: Router<S>, cors: &CorsConfig) -> anyhow::Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let allowed = HeaderValue::from_str(&cors.allowed_origin)
        .with_context(|| format!("Invalid CORS origin '{}'", cors.allowed_origin))?;

    let cors_layer = CorsLayer::new()
        .allow_origin(allowed.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(router
        .layer(cors_layer)
        .layer(middleware::from_fn_with_state(allowed, origin_gate)))
}

async fn origin_gate(
    State(allowed): State<HeaderValue>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match request.headers().get(header::ORIGIN) {
        None => Ok(next.run(request).await),
        Some(origin) if *origin == allowed => Ok(next.run(request).await),
        Some(origin) => {
            log::warn!("Rejected request from origin {:?}", origin);
            Err(ApiError::OriginRejected)
        }
    }
}
