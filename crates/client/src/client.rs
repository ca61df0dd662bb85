use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;

use loomworks_core::{ProductId, WorkerId};
use loomworks_expenses::Expense;
use loomworks_products::Product;
use loomworks_reports::{FinancialSummary, SalaryReport, WeeklyProfitPoint};
use loomworks_workers::Worker;

use crate::error::ClientError;
use crate::types::{
    DeletedCount, ExpenseInput, ExportLogEntry, ExportLogInput, PowerloomEntry, PowerloomInput,
    ProductInput, Revenue, WorkerInput,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The `{success, data, error, message}` wrapper every API route answers with.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}

/// Typed client for the workshop API.
///
/// `base_url` is the API prefix, e.g. `http://localhost:5000/api`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send and unwrap the envelope. A non-2xx status or `success: false`
    /// becomes [`ClientError::Api`].
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        self.exchange(req)
            .await?
            .ok_or_else(|| ClientError::Parse("response carried no data".to_string()))
    }

    /// For routes that only confirm with a message.
    async fn send_ack(&self, req: RequestBuilder) -> Result<(), ClientError> {
        self.exchange::<serde_json::Value>(req).await.map(|_| ())
    }

    async fn exchange<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>, ClientError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(env) => env,
            Err(err) if status.is_success() => return Err(ClientError::Parse(err.to_string())),
            Err(_) => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    error: status.canonical_reason().unwrap_or("Error").to_string(),
                    message: body,
                });
            }
        };

        if !status.is_success() || !envelope.success {
            let error = envelope.error.unwrap_or_else(|| "Error".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| error.clone()),
                error,
            });
        }

        Ok(envelope.data)
    }

    fn with_json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> RequestBuilder {
        self.request(method, path).json(body)
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        let response = self.request(Method::GET, "/health").send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                error: "Health check failed".to_string(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    // Workers

    pub async fn list_workers(&self) -> Result<Vec<Worker>, ClientError> {
        self.send(self.request(Method::GET, "/workers")).await
    }

    pub async fn get_worker(&self, id: WorkerId) -> Result<Worker, ClientError> {
        self.send(self.request(Method::GET, &format!("/workers/{id}"))).await
    }

    pub async fn create_worker(&self, input: &WorkerInput) -> Result<Worker, ClientError> {
        self.send(self.with_json(Method::POST, "/workers", input)).await
    }

    pub async fn update_worker(&self, id: WorkerId, input: &WorkerInput) -> Result<Worker, ClientError> {
        self.send(self.with_json(Method::PUT, &format!("/workers/{id}"), input))
            .await
    }

    pub async fn delete_worker(&self, id: WorkerId) -> Result<(), ClientError> {
        self.send_ack(self.request(Method::DELETE, &format!("/workers/{id}")))
            .await
    }

    // Products

    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        self.send(self.request(Method::GET, "/products")).await
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product, ClientError> {
        self.send(self.request(Method::GET, &format!("/products/{id}"))).await
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ClientError> {
        self.send(self.with_json(Method::POST, "/products", input)).await
    }

    pub async fn update_product(&self, id: ProductId, input: &ProductInput) -> Result<Product, ClientError> {
        self.send(self.with_json(Method::PUT, &format!("/products/{id}"), input))
            .await
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), ClientError> {
        self.send_ack(self.request(Method::DELETE, &format!("/products/{id}")))
            .await
    }

    // Expenses

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, ClientError> {
        self.send(self.request(Method::GET, "/expenses")).await
    }

    pub async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense, ClientError> {
        self.send(self.with_json(Method::POST, "/expenses", input)).await
    }

    // Powerloom production

    /// Entries for one loom when `loom` is set, otherwise every loom.
    pub async fn list_powerloom(&self, loom: Option<u8>) -> Result<Vec<PowerloomEntry>, ClientError> {
        let mut req = self.request(Method::GET, "/powerloom-production");
        if let Some(loom) = loom {
            req = req.query(&[("loom", loom)]);
        }
        self.send(req).await
    }

    pub async fn create_powerloom(&self, input: &PowerloomInput) -> Result<PowerloomEntry, ClientError> {
        self.send(self.with_json(Method::POST, "/powerloom-production", input))
            .await
    }

    /// Removes every entry on every loom; returns how many were deleted.
    pub async fn delete_all_powerloom(&self) -> Result<u64, ClientError> {
        let deleted: DeletedCount = self
            .send(self.request(Method::DELETE, "/powerloom-production"))
            .await?;
        Ok(deleted.deleted_count)
    }

    // Salary and export logs

    pub async fn loom_operator_salary(
        &self,
        worker: WorkerId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<SalaryReport, ClientError> {
        let req = self
            .request(Method::GET, &format!("/salary/loom-operators/{worker}"))
            .query(&range_query(from, to));
        self.send(req).await
    }

    pub async fn list_export_logs(&self, worker: Option<WorkerId>) -> Result<Vec<ExportLogEntry>, ClientError> {
        let mut req = self.request(Method::GET, "/export-logs");
        if let Some(worker) = worker {
            req = req.query(&[("workerId", worker.to_string())]);
        }
        self.send(req).await
    }

    pub async fn create_export_log(&self, input: &ExportLogInput) -> Result<ExportLogEntry, ClientError> {
        self.send(self.with_json(Method::POST, "/export-logs", input)).await
    }

    // Revenue and reports

    pub async fn revenue(&self) -> Result<Decimal, ClientError> {
        let revenue: Revenue = self
            .send(self.request(Method::GET, "/settings/revenue"))
            .await?;
        Ok(revenue.value)
    }

    pub async fn set_revenue(&self, value: Decimal) -> Result<Decimal, ClientError> {
        let revenue: Revenue = self
            .send(self.with_json(Method::PUT, "/settings/revenue", &Revenue { value }))
            .await?;
        Ok(revenue.value)
    }

    pub async fn weekly_profit(&self) -> Result<Vec<WeeklyProfitPoint>, ClientError> {
        self.send(self.request(Method::GET, "/reports/weekly-profit")).await
    }

    pub async fn financial_summary(&self) -> Result<FinancialSummary, ClientError> {
        self.send(self.request(Method::GET, "/reports/summary")).await
    }
}

fn range_query(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(from) = from {
        query.push(("from", from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = to {
        query.push(("to", to.format("%Y-%m-%d").to_string()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let client = ApiClient::with_client("http://localhost:5000/api/", reqwest::Client::new());
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn range_query_skips_missing_bounds() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 1);
        assert_eq!(range_query(from, None), vec![("from", "2025-01-01".to_string())]);
        assert!(range_query(None, None).is_empty());
    }

    #[test]
    fn failure_envelope_parses_without_data() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"success":false,"error":"Worker not found"}"#).unwrap();
        assert!(!env.success);
        assert_eq!(env.error.as_deref(), Some("Worker not found"));
        assert!(env.data.is_none());
    }
}
