use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use loomworks_core::DomainError;
use loomworks_infra::StoreError;
use loomworks_reports::ReportError;

/// Message shown in place of internal error details in production.
pub const GENERIC_SERVER_MESSAGE: &str = "Something went wrong";

/// Everything a handler can fail with. Each variant maps to one status code
/// and the `{success: false, error, message}` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// 400 with a route-specific error code.
    #[error("{message}")]
    BadRequest { error: &'static str, message: String },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Route {0} not found")]
    RouteNotFound(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::InvalidId(msg) => {
                tracing::debug!(%msg, "malformed id");
                ApiError::Validation("Invalid id format".to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate {
                collection: "products", ..
            } => ApiError::Duplicate("Product name must be unique".to_string()),
            StoreError::Duplicate { collection, .. } => {
                ApiError::Duplicate(format!("A record with this key already exists in {collection}"))
            }
            other => ApiError::Store(other),
        }
    }
}

/// Internal error text carried on a 500 response. The error-detail
/// middleware swaps it into the body outside production.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                tracing::debug!(%message, "validation rejected");
                json_error(StatusCode::BAD_REQUEST, "Validation Error", message)
            }
            ApiError::BadRequest { error, message } => {
                tracing::debug!(error, %message, "request rejected");
                json_error(StatusCode::BAD_REQUEST, error, message)
            }
            ApiError::Duplicate(message) => json_error(StatusCode::BAD_REQUEST, "Duplicate", message),
            ApiError::NotFound(kind) => (
                StatusCode::NOT_FOUND,
                axum::Json(json!({
                    "success": false,
                    "error": format!("{kind} not found"),
                })),
            )
                .into_response(),
            ApiError::RouteNotFound(path) => {
                json_error(StatusCode::NOT_FOUND, "Not Found", format!("Route {path} not found"))
            }
            ApiError::Store(err) => {
                tracing::error!(error = %err, "storage failure");
                internal_error(err.to_string())
            }
            ApiError::Report(err) => {
                tracing::error!(error = %err, "report failed");
                internal_error(err.to_string())
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn internal_error(detail: String) -> Response {
    let mut response = json_error(StatusCode::INTERNAL_SERVER_ERROR, "Server Error", GENERIC_SERVER_MESSAGE);
    response.extensions_mut().insert(InternalErrorDetail(detail));
    response
}

/// Parse a path or body id, reporting failures as a 400.
pub fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: std::str::FromStr<Err = DomainError>,
{
    raw.trim().parse::<T>().map_err(ApiError::from)
}
