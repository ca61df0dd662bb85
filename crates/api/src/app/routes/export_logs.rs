//! Append-only export history. There is no update or delete route.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::Response,
    routing::get,
    Router,
};

use loomworks_core::WorkerId;

use crate::app::dto::{self, CreateExportLogRequest, ExportLogQuery};
use crate::app::errors::{parse_id, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(list_export_logs).post(create_export_log))
}

pub async fn list_export_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ExportLogQuery>,
) -> ApiResult<Response> {
    let worker = match query.worker_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_id::<WorkerId>(raw)?),
        None => None,
    };
    Ok(dto::ok_list(services.list_export_logs(worker).await?))
}

pub async fn create_export_log(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateExportLogRequest>,
) -> ApiResult<Response> {
    Ok(dto::created(services.create_export_log(body.into()).await?))
}
