use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Loomworks backend is running" }))
}

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Json<serde_json::Value> {
    let status = services.store_status().await;
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "database": status.backend,
    }))
}

/// 200 when the store answers, 503 otherwise.
pub async fn db_status(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let status = services.store_status().await;
    let code = if status.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let label = if status.connected { "Connected" } else { "Disconnected" };
    (
        code,
        Json(json!({
            "status": label,
            "backend": status.backend,
            "connected": status.connected,
            "detail": status.detail,
        })),
    )
        .into_response()
}

pub async fn not_found(uri: Uri) -> ApiError {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or(uri.path());
    ApiError::RouteNotFound(path.to_string())
}
