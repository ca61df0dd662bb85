//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring and the operations handlers call
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response bodies and envelope helpers
//! - `errors.rs`: status code + envelope mapping
//! - `extract.rs`: JSON body extractor with envelope rejections

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router over already-wired services.
pub fn build_app(config: &ApiConfig, services: Arc<AppServices>) -> Router {
    let cors = middleware::CorsState::new(config.allowed_origins.clone(), !config.app_env.is_production());

    let mut app = Router::new()
        .route("/", get(routes::system::root))
        .nest("/api", routes::router())
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    if !config.app_env.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::expose_error_details));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::request_logging))
            .layer(axum::middleware::from_fn_with_state(cors, middleware::cors_middleware)),
    )
}

/// Wire services for `config` (Postgres or in-memory) and build the router.
pub async fn build_app_from_config(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_app(config, Arc::new(services)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use loomworks_reports::SalaryPolicy;
    use tower::ServiceExt;

    fn app() -> Router {
        build_app(&ApiConfig::default(), Arc::new(AppServices::in_memory(SalaryPolicy::default())))
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_routes_get_the_not_found_envelope() {
        let response = app()
            .oneshot(Request::get("/api/nope?x=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Route /api/nope?x=1 not found");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let response = app()
            .oneshot(
                Request::post("/api/workers")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"name\":"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "Validation Error");
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin_is_answered() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/workers")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn foreign_origin_is_rejected() {
        let response = app()
            .oneshot(
                Request::get("/api/health")
                    .header(header::ORIGIN, "https://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn report_overflow_on_stored_data_is_a_server_error_envelope() {
        use chrono::Utc;
        use loomworks_core::ExpenseId;
        use loomworks_expenses::{Expense, NewExpense};
        use loomworks_reports::RevenueSetting;
        use rust_decimal::Decimal;

        let services = Arc::new(AppServices::in_memory(SalaryPolicy::default()));
        let mut revenue = RevenueSetting::total_revenue(Decimal::ZERO, Utc::now()).unwrap();
        revenue.value = Decimal::MAX;
        services.settings.upsert(revenue).await.unwrap();
        for day in ["2024-01-01", "2024-01-08"] {
            let input = NewExpense {
                expense_type: Some("Utilities".to_string()),
                amount: Some(Decimal::TEN),
                date: Some(day.to_string()),
                ..NewExpense::default()
            };
            let expense = Expense::create(ExpenseId::new(), input, Utc::now()).unwrap();
            services.expenses.insert(expense).await.unwrap();
        }

        let response = build_app(&ApiConfig::default(), services)
            .oneshot(Request::get("/api/reports/weekly-profit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Server Error");
        assert_eq!(body["message"], "revenue share overflowed");
    }

    #[tokio::test]
    async fn health_reports_the_backend() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["database"], "memory");
    }
}
