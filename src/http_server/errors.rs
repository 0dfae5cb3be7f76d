//! # HTTP API Errors
//!
//! Every failure leaves the API as `{ "error", "code", ... }` with a status
//! derived from the underlying error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::markdown::MarkdownViolation;
use crate::query::QueryError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Path id that is not a UUID
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// Request body that could not be decoded
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Query(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Query(_) => StatusCode::SERVICE_UNAVAILABLE,

            ApiError::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Catalog(CatalogError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Catalog(CatalogError::Store(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,

            ApiError::InvalidId(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Query(err) => err.code(),
            ApiError::Catalog(err) => err.code(),
            ApiError::InvalidId(_) => "SHELF_NOT_FOUND",
            ApiError::InvalidBody(_) => "SHELF_INVALID_BODY",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    /// Offending request parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    /// Offending parameter values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<MarkdownViolation>>,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let mut body = ErrorResponse {
            error: err.to_string(),
            code: err.code(),
            field: None,
            invalid: None,
            violations: None,
        };

        match err {
            ApiError::Query(QueryError::Validation(validation)) => {
                body.field = Some(validation.parameter());
                body.invalid = Some(validation.invalid_values());
            }
            ApiError::Catalog(CatalogError::Rejected(violations)) => {
                body.field = Some("body");
                body.violations = Some(violations);
            }
            _ => {}
        }

        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::query::{StoreError, ValidationError};

    #[test]
    fn test_validation_error_is_bad_request_with_detail() {
        let err = ApiError::from(QueryError::from(ValidationError::InvalidSortField(vec![
            "bogus".to_string(),
        ])));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = serde_json::to_value(ErrorResponse::from(err)).unwrap();
        assert_eq!(body["code"], "SHELF_INVALID_SORT_FIELD");
        assert_eq!(body["field"], "sort");
        assert_eq!(body["invalid"], serde_json::json!(["bogus"]));
        assert!(body.get("violations").is_none());
    }

    #[test]
    fn test_store_failures_and_cancellation_are_unavailable() {
        let store = ApiError::from(QueryError::from(StoreError::Timeout(500)));
        assert_eq!(store.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let cancelled = ApiError::from(QueryError::Cancelled);
        assert_eq!(cancelled.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(cancelled.code(), "SHELF_QUERY_CANCELLED");
    }

    #[test]
    fn test_catalog_errors() {
        let missing = ApiError::from(CatalogError::NotFound {
            resource: "books",
            id: Uuid::nil(),
        });
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let rejected = ApiError::from(CatalogError::Rejected(Vec::new()));
        assert_eq!(rejected.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
