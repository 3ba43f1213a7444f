//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use service::ServiceError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain rule violation.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Duplicate { .. }
        | DomainError::InvalidStateTransition { .. }
        | DomainError::OrderClosed { .. } => StatusCode::CONFLICT,
        DomainError::InvalidQuantity { .. }
        | DomainError::NegativePrice { .. }
        | DomainError::NegativeStock { .. }
        | DomainError::ExcessPrecision { .. }
        | DomainError::OutOfRange { .. }
        | DomainError::EmptyField { .. }
        | DomainError::CategoryMismatch { .. }
        | DomainError::MalformedId { .. } => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(err) => ApiError::Domain(err),
            ServiceError::Store(StoreError::RowNotFound { entity, id }) => {
                ApiError::NotFound(format!("{entity} not found: {id}"))
            }
            ServiceError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}
