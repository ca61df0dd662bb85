use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use loomworks_core::{DateRange, ExpenseId};
use loomworks_expenses::ExpenseFilter;

use crate::app::dto::{self, CreateExpenseRequest, ExpenseListQuery, StatsQuery, UpdateExpenseRequest};
use crate::app::errors::{parse_id, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/stats/summary", get(expense_summary))
        .route("/:id", get(get_expense).put(update_expense).delete(delete_expense))
}

pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ExpenseListQuery>,
) -> ApiResult<Response> {
    let filter = ExpenseFilter::parse(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        query.expense_type.as_deref(),
        query.category.as_deref(),
    )?;
    let (expenses, total) = services.list_expenses(&filter).await?;
    Ok(Json(json!({
        "success": true,
        "count": expenses.len(),
        "total": total,
        "data": expenses,
    }))
    .into_response())
}

pub async fn get_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ExpenseId = parse_id(&id)?;
    Ok(dto::ok(services.get_expense(id).await?))
}

pub async fn create_expense(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateExpenseRequest>,
) -> ApiResult<Response> {
    Ok(dto::created(services.create_expense(body.into()).await?))
}

pub async fn update_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateExpenseRequest>,
) -> ApiResult<Response> {
    let id: ExpenseId = parse_id(&id)?;
    Ok(dto::ok(services.update_expense(id, body.into()).await?))
}

pub async fn delete_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ExpenseId = parse_id(&id)?;
    services.delete_expense(id).await?;
    Ok(dto::ok_message("Expense deleted successfully"))
}

pub async fn expense_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Response> {
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?;
    Ok(dto::ok(services.expense_summary(range).await?))
}
