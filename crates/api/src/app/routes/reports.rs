use std::sync::Arc;

use axum::{extract::Extension, response::Response, routing::get, Router};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/weekly-profit", get(weekly_profit))
        .route("/summary", get(financial_summary))
}

pub async fn weekly_profit(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    Ok(dto::ok_list(services.weekly_profit().await?))
}

pub async fn financial_summary(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    Ok(dto::ok(services.financial_summary().await?))
}
