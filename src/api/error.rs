//! API Error Mapping
//! Mission: Every failure resolves to a `{ "message": ... }` payload

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::error::ServiceError;

/// Wrapper giving `ServiceError` an HTTP shape.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ServiceError::Forbidden => (StatusCode::FORBIDDEN, self.0.to_string()),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::Storage(err) => {
                error!("Storage failure: {:#}", err);
                // Diagnostic detail only outside release builds.
                let message = if cfg!(debug_assertions) {
                    format!("Storage failure: {}", err)
                } else {
                    "Internal server error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
