//! Request and response bodies, and the JSON envelope helpers.
//!
//! Requests are deserialized into these explicit structs and then converted
//! into the domain input types, which do the actual validation.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use loomworks_core::{ExportLogId, LoomNumber, PowerloomEntryId, ProductId, ProductionRecordId, WorkerId};
use loomworks_expenses::{ExpensePatch, NewExpense};
use loomworks_production::{
    NewMachineEntry, NewPowerloomProduction, NewProductionRecord, PowerloomProduction, ProductionRecord,
    ProductionRecordPatch, QualityGrade, Shift,
};
use loomworks_products::{NewProduct, Product, ProductPatch};
use loomworks_reports::{ExportLog, NewExportLog, SalaryReport};
use loomworks_workers::{NewWorker, Worker, WorkerPatch, WorkerRole};

// ---------- envelope ----------

/// `200 {success: true, data}`
pub fn ok<T: Serialize>(data: T) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

/// `201 {success: true, data}`
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(json!({ "success": true, "data": data }))).into_response()
}

/// `200 {success: true, count, data}`
pub fn ok_list<T: Serialize>(items: Vec<T>) -> Response {
    Json(json!({ "success": true, "count": items.len(), "data": items })).into_response()
}

/// `200 {success: true, message}`
pub fn ok_message(message: &str) -> Response {
    Json(json!({ "success": true, "message": message })).into_response()
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`), so updates can clear optional values.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Out-of-range numbers become 0, which every loom/machine check rejects.
fn narrow(n: i64) -> u8 {
    u8::try_from(n).unwrap_or(0)
}

// ---------- workers ----------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub power_loom_number: Option<i64>,
    pub role: Option<String>,
    pub salary: Option<Decimal>,
    pub hire_date: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateWorkerRequest> for NewWorker {
    fn from(req: CreateWorkerRequest) -> Self {
        NewWorker {
            name: req.name.unwrap_or_default(),
            phone: req.phone.unwrap_or_default(),
            power_loom_number: req.power_loom_number.map(narrow),
            role: req.role,
            salary: req.salary,
            hire_date: req.hire_date,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub power_loom_number: Option<i64>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
    pub hire_date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl From<UpdateWorkerRequest> for WorkerPatch {
    fn from(req: UpdateWorkerRequest) -> Self {
        WorkerPatch {
            name: req.name,
            phone: req.phone,
            power_loom_number: req.power_loom_number.map(narrow),
            role: req.role,
            salary: req.salary,
            is_active: req.is_active,
            hire_date: req.hire_date,
            notes: req.notes,
        }
    }
}

/// Body of `GET /api/workers/:id/salary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "basis", rename_all = "lowercase")]
pub enum WorkerSalaryView {
    Production { report: SalaryReport },
    Fixed { amount: Decimal },
}

// ---------- products ----------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub worker_salary: Option<Decimal>,
    pub owner_salary: Option<Decimal>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            name: req.name.unwrap_or_default(),
            worker_salary: req.worker_salary,
            owner_salary: req.owner_salary,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub worker_salary: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner_salary: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: req.name,
            worker_salary: req.worker_salary,
            owner_salary: req.owner_salary,
            is_active: req.is_active,
        }
    }
}

// ---------- expenses ----------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub expense_type: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub receipt: Option<String>,
    pub is_approved: Option<bool>,
}

impl From<CreateExpenseRequest> for NewExpense {
    fn from(req: CreateExpenseRequest) -> Self {
        NewExpense {
            expense_type: req.expense_type,
            amount: req.amount,
            date: req.date,
            description: req.description,
            category: req.category,
            receipt: req.receipt,
            is_approved: req.is_approved,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub expense_type: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub receipt: Option<Option<String>>,
    pub is_approved: Option<bool>,
}

impl From<UpdateExpenseRequest> for ExpensePatch {
    fn from(req: UpdateExpenseRequest) -> Self {
        ExpensePatch {
            expense_type: req.expense_type,
            amount: req.amount,
            date: req.date,
            description: req.description,
            category: req.category,
            receipt: req.receipt,
            is_approved: req.is_approved,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub expense_type: Option<String>,
    pub category: Option<String>,
}

/// `startDate`/`endDate` for the summary endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ---------- shift production records ----------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductionRequest {
    pub date: Option<String>,
    pub worker: Option<String>,
    pub machine_number: Option<String>,
    pub quantity_produced: Option<Decimal>,
    pub product_type: Option<String>,
    pub shift: Option<String>,
    pub quality_grade: Option<String>,
    pub notes: Option<String>,
    pub wastage: Option<Decimal>,
}

impl From<CreateProductionRequest> for NewProductionRecord {
    fn from(req: CreateProductionRequest) -> Self {
        NewProductionRecord {
            date: req.date,
            worker: req.worker,
            machine_number: req.machine_number,
            quantity_produced: req.quantity_produced,
            product_type: req.product_type,
            shift: req.shift,
            quality_grade: req.quality_grade,
            notes: req.notes,
            wastage: req.wastage,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductionRequest {
    pub date: Option<String>,
    pub worker: Option<String>,
    pub machine_number: Option<String>,
    pub quantity_produced: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub product_type: Option<Option<String>>,
    pub shift: Option<String>,
    pub quality_grade: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub wastage: Option<Decimal>,
}

impl From<UpdateProductionRequest> for ProductionRecordPatch {
    fn from(req: UpdateProductionRequest) -> Self {
        ProductionRecordPatch {
            date: req.date,
            worker: req.worker,
            machine_number: req.machine_number,
            quantity_produced: req.quantity_produced,
            product_type: req.product_type,
            shift: req.shift,
            quality_grade: req.quality_grade,
            notes: req.notes,
            wastage: req.wastage,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub worker: Option<String>,
    pub machine_number: Option<String>,
    pub shift: Option<String>,
}

// ---------- powerloom production ----------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineRequest {
    pub index: Option<i64>,
    pub product: Option<String>,
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePowerloomRequest {
    pub loom_number: Option<i64>,
    pub date: Option<String>,
    pub worker: Option<String>,
    pub machines: Option<Vec<MachineRequest>>,
}

impl From<CreatePowerloomRequest> for NewPowerloomProduction {
    fn from(req: CreatePowerloomRequest) -> Self {
        NewPowerloomProduction {
            loom_number: req.loom_number,
            date: req.date,
            worker: req.worker,
            machines: req.machines.map(|machines| {
                machines
                    .into_iter()
                    .map(|m| NewMachineEntry {
                        index: m.index,
                        product: m.product,
                        quantity: m.quantity,
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerloomQuery {
    pub loom: Option<String>,
}

// ---------- export logs / salary ----------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExportLogRequest {
    pub worker_id: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub salary: Option<Decimal>,
}

impl From<CreateExportLogRequest> for NewExportLog {
    fn from(req: CreateExportLogRequest) -> Self {
        NewExportLog {
            worker_id: req.worker_id,
            from_date: req.from_date,
            to_date: req.to_date,
            salary: req.salary,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogQuery {
    pub worker_id: Option<String>,
}

/// Inclusive calendar-day range for salary reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalaryRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

// ---------- settings ----------

/// Kept as raw JSON so non-numeric values get the revenue-specific error
/// instead of a generic body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevenueRequest {
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevenueView {
    pub value: Decimal,
}

// ---------- populated views ----------

/// A worker reference with whichever fields the route embeds. Missing
/// workers serialize as the bare id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub id: WorkerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<WorkerRole>,
}

impl WorkerSummary {
    fn bare(id: WorkerId) -> Self {
        Self {
            id,
            name: None,
            phone: None,
            role: None,
        }
    }

    pub fn name_only(id: WorkerId, worker: Option<&Worker>) -> Self {
        Self {
            name: worker.map(|w| w.name.clone()),
            ..Self::bare(id)
        }
    }

    pub fn with_phone(id: WorkerId, worker: Option<&Worker>) -> Self {
        Self {
            name: worker.map(|w| w.name.clone()),
            phone: worker.map(|w| w.phone.clone()),
            ..Self::bare(id)
        }
    }

    pub fn with_role(id: WorkerId, worker: Option<&Worker>) -> Self {
        Self {
            name: worker.map(|w| w.name.clone()),
            role: worker.map(|w| w.role),
            ..Self::bare(id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRef {
    pub id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineView {
    pub index: u8,
    pub product: ProductRef,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerloomView {
    pub id: PowerloomEntryId,
    pub loom_number: LoomNumber,
    pub date: DateTime<Utc>,
    pub worker: WorkerSummary,
    pub machines: Vec<MachineView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PowerloomView {
    pub fn populate(
        entry: PowerloomProduction,
        workers: &HashMap<WorkerId, Worker>,
        products: &HashMap<ProductId, Product>,
    ) -> Self {
        Self {
            id: entry.id,
            loom_number: entry.loom_number,
            date: entry.date,
            worker: WorkerSummary::name_only(entry.worker, workers.get(&entry.worker)),
            machines: entry
                .machines
                .into_iter()
                .map(|m| MachineView {
                    index: m.index,
                    product: ProductRef {
                        id: m.product,
                        name: products.get(&m.product).map(|p| p.name.clone()),
                    },
                    quantity: m.quantity,
                })
                .collect(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecordView {
    pub id: ProductionRecordId,
    pub date: DateTime<Utc>,
    pub worker: WorkerSummary,
    pub machine_number: String,
    pub quantity_produced: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    pub shift: Shift,
    pub quality_grade: QualityGrade,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub wastage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductionRecordView {
    pub fn populate(record: ProductionRecord, workers: &HashMap<WorkerId, Worker>) -> Self {
        Self {
            id: record.id,
            date: record.date,
            worker: WorkerSummary::with_phone(record.worker, workers.get(&record.worker)),
            machine_number: record.machine_number,
            quantity_produced: record.quantity_produced,
            product_type: record.product_type,
            shift: record.shift,
            quality_grade: record.quality_grade,
            notes: record.notes,
            wastage: record.wastage,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogView {
    pub id: ExportLogId,
    pub worker: WorkerSummary,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub salary: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExportLogView {
    pub fn populate(log: ExportLog, workers: &HashMap<WorkerId, Worker>) -> Self {
        Self {
            id: log.id,
            worker: WorkerSummary::with_role(log.worker, workers.get(&log.worker)),
            from_date: log.from_date,
            to_date: log.to_date,
            salary: log.salary,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_absent() {
        let absent: UpdateWorkerRequest = serde_json::from_str(r#"{"name":"Ravi"}"#).unwrap();
        assert_eq!(absent.salary, None);
        assert_eq!(absent.notes, None);

        let cleared: UpdateWorkerRequest = serde_json::from_str(r#"{"salary":null,"notes":null}"#).unwrap();
        assert_eq!(cleared.salary, Some(None));
        assert_eq!(cleared.notes, Some(None));

        let set: UpdateWorkerRequest = serde_json::from_str(r#"{"salary":1200}"#).unwrap();
        assert_eq!(set.salary, Some(Some(Decimal::new(1200, 0))));
    }

    #[test]
    fn out_of_range_loom_numbers_become_zero() {
        let req: CreateWorkerRequest = serde_json::from_str(r#"{"powerLoomNumber":300}"#).unwrap();
        assert_eq!(NewWorker::from(req).power_loom_number, Some(0));
    }

    #[test]
    fn salary_view_is_tagged_by_basis() {
        let json = serde_json::to_value(WorkerSalaryView::Fixed {
            amount: Decimal::new(15000, 0),
        })
        .unwrap();
        assert_eq!(json["basis"], "fixed");
        assert_eq!(json["amount"], 15000.0);
    }

    #[test]
    fn missing_worker_serializes_as_bare_id() {
        let id = WorkerId::new();
        let json = serde_json::to_value(WorkerSummary::with_role(id, None)).unwrap();
        assert_eq!(json, json!({ "id": id.to_string() }));
    }
}
