use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::get,
    Router,
};

use loomworks_core::ProductId;

use crate::app::dto::{self, CreateProductRequest, UpdateProductRequest};
use crate::app::errors::{parse_id, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    Ok(dto::ok_list(services.list_products().await?))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ProductId = parse_id(&id)?;
    Ok(dto::ok(services.get_product(id).await?))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> ApiResult<Response> {
    Ok(dto::created(services.create_product(body.into()).await?))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> ApiResult<Response> {
    let id: ProductId = parse_id(&id)?;
    Ok(dto::ok(services.update_product(id, body.into()).await?))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ProductId = parse_id(&id)?;
    services.deactivate_product(id).await?;
    Ok(dto::ok_message("Product deleted successfully"))
}
