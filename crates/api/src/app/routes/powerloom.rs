use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

use loomworks_production::PowerloomFilter;

use crate::app::dto::{self, CreatePowerloomRequest, PowerloomQuery};
use crate::app::errors::ApiResult;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route(
        "/",
        get(list_powerloom)
            .post(create_powerloom)
            .delete(delete_all_powerloom),
    )
}

/// `?loom=1|2|3`; any other value lists every loom.
pub async fn list_powerloom(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PowerloomQuery>,
) -> ApiResult<Response> {
    let filter = PowerloomFilter::from_query(query.loom.as_deref());
    Ok(dto::ok_list(services.list_powerloom(filter).await?))
}

pub async fn create_powerloom(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreatePowerloomRequest>,
) -> ApiResult<Response> {
    Ok(dto::created(services.create_powerloom(body.into()).await?))
}

pub async fn delete_all_powerloom(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let deleted = services.delete_all_powerloom().await?;
    Ok(dto::ok(json!({ "deletedCount": deleted })))
}
