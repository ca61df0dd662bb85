use std::sync::Arc;

use axum::{extract::Extension, response::Response, routing::get, Router};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::app::dto::{self, RevenueRequest, RevenueView};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/revenue", get(get_revenue).put(put_revenue))
}

pub async fn get_revenue(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let value = services.total_revenue().await?;
    Ok(dto::ok(RevenueView { value }))
}

/// Accepts only a finite JSON number; strings, null and missing values are
/// rejected like negatives.
pub async fn put_revenue(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RevenueRequest>,
) -> ApiResult<Response> {
    let value = body
        .value
        .as_ref()
        .and_then(revenue_number)
        .ok_or_else(|| ApiError::BadRequest {
            error: "Invalid value",
            message: "Value must be a non-negative number".to_string(),
        })?;
    let value = services.set_total_revenue(value).await?;
    Ok(dto::ok(RevenueView { value }))
}

fn revenue_number(value: &serde_json::Value) -> Option<Decimal> {
    let number = value.as_number()?;
    if let Some(n) = number.as_i64() {
        return Some(Decimal::from(n));
    }
    number.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64)
}
