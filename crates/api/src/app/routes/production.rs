//! Shift production records.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use loomworks_core::{DateRange, ProductionRecordId};
use loomworks_production::ProductionFilter;

use crate::app::dto::{self, CreateProductionRequest, ProductionListQuery, StatsQuery, UpdateProductionRequest};
use crate::app::errors::{parse_id, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_production).post(create_production))
        .route("/stats/summary", get(production_summary))
        .route(
            "/:id",
            get(get_production).put(update_production).delete(delete_production),
        )
}

pub async fn list_production(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ProductionListQuery>,
) -> ApiResult<Response> {
    let filter = ProductionFilter::parse(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        query.worker.as_deref(),
        query.machine_number.as_deref(),
        query.shift.as_deref(),
    )?;
    let (records, total_quantity, total_wastage) = services.list_production(&filter).await?;
    Ok(Json(json!({
        "success": true,
        "count": records.len(),
        "totalQuantity": total_quantity,
        "totalWastage": total_wastage,
        "data": records,
    }))
    .into_response())
}

pub async fn get_production(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ProductionRecordId = parse_id(&id)?;
    Ok(dto::ok(services.get_production(id).await?))
}

pub async fn create_production(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateProductionRequest>,
) -> ApiResult<Response> {
    Ok(dto::created(services.create_production(body.into()).await?))
}

pub async fn update_production(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateProductionRequest>,
) -> ApiResult<Response> {
    let id: ProductionRecordId = parse_id(&id)?;
    Ok(dto::ok(services.update_production(id, body.into()).await?))
}

pub async fn delete_production(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ProductionRecordId = parse_id(&id)?;
    services.delete_production(id).await?;
    Ok(dto::ok_message("Production record deleted successfully"))
}

pub async fn production_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Response> {
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?;
    Ok(dto::ok(services.production_summary(range).await?))
}
