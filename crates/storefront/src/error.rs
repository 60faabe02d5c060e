//! Application error type and its HTTP mapping.
//!
//! Handlers return `Result<_, AppError>`; the `IntoResponse` impl decides
//! the status code and renders the body as `{"error": "..."}`. Server-side
//! failures are reported to Sentry with the client seeing a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use reign_core::OrderStatus;

use crate::db::RepositoryError;
use crate::pricing::PricingError;
use crate::services::GeocodingError;

/// Top-level error type for request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error(transparent)]
    Geocoding(#[from] GeocodingError),
    #[error("{0}")]
    ExternalService(String),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Repository(RepositoryError::NotFound) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Repository(RepositoryError::Conflict(_)) | Self::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Geocoding(_) | Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Never leak database details to clients.
            Self::Repository(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Repository(RepositoryError::Conflict(_)) => "Conflict".to_string(),
            Self::Repository(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            sentry::capture_error(&self);
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
