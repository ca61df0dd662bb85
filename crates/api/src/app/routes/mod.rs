use axum::{routing::get, Router};

pub mod expenses;
pub mod export_logs;
pub mod powerloom;
pub mod production;
pub mod products;
pub mod reports;
pub mod salary;
pub mod settings;
pub mod system;
pub mod workers;

/// Every `/api` resource.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/db-status", get(system::db_status))
        .nest("/workers", workers::router())
        .nest("/products", products::router())
        .nest("/expenses", expenses::router())
        .nest("/production", production::router())
        .nest("/powerloom-production", powerloom::router())
        .nest("/export-logs", export_logs::router())
        .nest("/settings", settings::router())
        .nest("/salary", salary::router())
        .nest("/reports", reports::router())
}
