use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Failures surfaced by the API. Only the public message reaches the client;
/// persistence detail is logged.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{public}")]
    Persistence {
        public: &'static str,
        detail: anyhow::Error,
    },
    #[error("Not allowed by CORS")]
    OriginRejected,
}

impl ApiError {
    pub fn persistence(public: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |detail| ApiError::Persistence { public, detail }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::OriginRejected => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Persistence { public, detail } = &self {
            log::error!("{}: {:#}", public, detail);
        }
        (self.status(), Json(ErrorResponse::new(&self.to_string()))).into_response()
    }
}
