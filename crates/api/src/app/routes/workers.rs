use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    routing::get,
    Router,
};

use loomworks_core::{DateRange, WorkerId};

use crate::app::dto::{self, CreateWorkerRequest, SalaryRangeQuery, UpdateWorkerRequest};
use crate::app::errors::{parse_id, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_workers).post(create_worker))
        .route("/:id", get(get_worker).put(update_worker).delete(delete_worker))
        .route("/:id/salary", get(worker_salary))
}

pub async fn list_workers(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    Ok(dto::ok_list(services.list_workers().await?))
}

pub async fn get_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: WorkerId = parse_id(&id)?;
    Ok(dto::ok(services.get_worker(id).await?))
}

pub async fn create_worker(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateWorkerRequest>,
) -> ApiResult<Response> {
    Ok(dto::created(services.create_worker(body.into()).await?))
}

pub async fn update_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateWorkerRequest>,
) -> ApiResult<Response> {
    let id: WorkerId = parse_id(&id)?;
    Ok(dto::ok(services.update_worker(id, body.into()).await?))
}

/// Soft delete: the worker stays addressable by id but leaves the list.
pub async fn delete_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: WorkerId = parse_id(&id)?;
    services.deactivate_worker(id).await?;
    Ok(dto::ok_message("Worker deleted successfully"))
}

pub async fn worker_salary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(range): Query<SalaryRangeQuery>,
) -> ApiResult<Response> {
    let id: WorkerId = parse_id(&id)?;
    let range = DateRange::parse(range.from.as_deref(), range.to.as_deref())?;
    Ok(dto::ok(services.worker_salary(id, range).await?))
}
