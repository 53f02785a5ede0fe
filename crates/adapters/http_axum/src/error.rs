//! HTTP error response mapping.
//!
//! Every error leaves the API as `{"error": "..."}`, including the
//! rejections produced by axum's `Json`, `Query` and `Path` extractors.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use geofence_domain::error::{DegradedError, GeofenceError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`GeofenceError`] and extractor rejections to an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    Domain(GeofenceError),
    /// The request did not parse into the handler's arguments.
    Rejected { status: StatusCode, message: String },
}

impl From<GeofenceError> for ApiError {
    fn from(err: GeofenceError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<DegradedError> for ApiError {
    fn from(err: DegradedError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Rejected { status, message } => (status, message),
            Self::Domain(GeofenceError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(GeofenceError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(GeofenceError::Dependency(err)) => {
                tracing::error!(error = %err, "dependency error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            Self::Domain(GeofenceError::Degraded(err)) => {
                tracing::warn!(error = %err, "degraded dependency");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service temporarily unavailable".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
