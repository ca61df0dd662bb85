//! Loom-operator salary reports and their export.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use loomworks_core::{DateRange, WorkerId};
use loomworks_reports::ExportMatrix;

use crate::app::dto::{self, SalaryRangeQuery};
use crate::app::errors::{parse_id, ApiResult};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/loom-operators/:worker_id", get(loom_operator_salary))
        .route("/loom-operators/:worker_id/export", post(export_salary))
        .route("/loom-operators/:worker_id/export.csv", get(export_salary_csv))
}

fn parse_request(worker_id: &str, query: &SalaryRangeQuery) -> ApiResult<(WorkerId, DateRange)> {
    let worker: WorkerId = parse_id(worker_id)?;
    let range = DateRange::parse(query.from.as_deref(), query.to.as_deref())?;
    Ok((worker, range))
}

pub async fn loom_operator_salary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(worker_id): Path<String>,
    Query(query): Query<SalaryRangeQuery>,
) -> ApiResult<Response> {
    let (worker, range) = parse_request(&worker_id, &query)?;
    Ok(dto::ok(services.loom_operator_salary(worker, range).await?))
}

/// Render the matrix and record the export in the log.
pub async fn export_salary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(worker_id): Path<String>,
    Query(query): Query<SalaryRangeQuery>,
) -> ApiResult<Response> {
    let (worker, range) = parse_request(&worker_id, &query)?;
    let (matrix, log) = services.export_salary(worker, range).await?;
    Ok(dto::created(json!({ "matrix": matrix, "log": log })))
}

/// CSV download of the same matrix. Not logged.
pub async fn export_salary_csv(
    Extension(services): Extension<Arc<AppServices>>,
    Path(worker_id): Path<String>,
    Query(query): Query<SalaryRangeQuery>,
) -> ApiResult<Response> {
    let (worker, range) = parse_request(&worker_id, &query)?;
    let matrix = services.salary_matrix(worker, range).await?;
    let body = matrix.to_csv()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name(&matrix)),
            ),
        ],
        body,
    )
        .into_response())
}

fn file_name(matrix: &ExportMatrix) -> String {
    let name: String = matrix
        .worker_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let name = if name.trim_matches('-').is_empty() { "worker" } else { name.as_str() };
    format!("loom-operator-{name}-{}-{}.csv", matrix.from_date, matrix.to_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn matrix(worker_name: &str) -> ExportMatrix {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        ExportMatrix {
            worker_name: worker_name.to_string(),
            header: vec![],
            columns: vec![],
            rows: vec![],
            salary_row: vec![],
            total_salary: Default::default(),
            from_date: day,
            to_date: day,
        }
    }

    #[test]
    fn file_names_are_header_safe() {
        assert_eq!(
            file_name(&matrix("Ravi Kumar")),
            "loom-operator-Ravi-Kumar-2024-03-01-2024-03-01.csv"
        );
        assert_eq!(file_name(&matrix("\"\"")), "loom-operator-worker-2024-03-01-2024-03-01.csv");
    }
}
