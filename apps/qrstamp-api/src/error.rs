//! Error types for the qrstamp API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use map_render::{GeocodeError, MapError, PolygonError};
use qr_overlay::QrError;
use serde_json::json;
use signature_pages::StampError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream service failed: {0}")]
    Upstream(String),

    #[error("Processing failed: {0}")]
    Processing(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Processing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::InvalidRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                msg.clone()
            }
            ApiError::Processing(msg) => {
                tracing::error!("Processing error: {}", msg);
                msg.clone()
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal error".to_string()
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<QrError> for ApiError {
    fn from(err: QrError) -> Self {
        match err {
            QrError::Encode(_) | QrError::InvalidColor(_) => ApiError::InvalidRequest(err.to_string()),
            QrError::Png(_) | QrError::Font(_) => ApiError::Processing(err.to_string()),
        }
    }
}

impl From<StampError> for ApiError {
    fn from(err: StampError) -> Self {
        match err {
            StampError::Parse(_) => ApiError::InvalidRequest(err.to_string()),
            StampError::Processing(_) | StampError::Encryption(_) => ApiError::Processing(err.to_string()),
        }
    }
}

impl From<MapError> for ApiError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::NoMarkers | MapError::InvalidCoordinate(_) => ApiError::InvalidRequest(err.to_string()),
            MapError::Tile { .. } => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<GeocodeError> for ApiError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            GeocodeError::Request(_) | GeocodeError::Status(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<PolygonError> for ApiError {
    fn from(err: PolygonError) -> Self {
        ApiError::InvalidRequest(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(anyhow::anyhow!("Worker task failed: {}", err))
    }
}
