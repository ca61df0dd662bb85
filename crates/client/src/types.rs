//! Request bodies and the populated views the server returns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{ExportLogId, PowerloomEntryId, ProductId, WorkerId};
use loomworks_workers::WorkerRole;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerInput {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_loom_number: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub worker_salary: Decimal,
    pub owner_salary: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    pub expense_type: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineInput {
    pub index: u8,
    pub product: ProductId,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerloomInput {
    pub loom_number: u8,
    pub date: String,
    pub worker: WorkerId,
    pub machines: Vec<MachineInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogInput {
    pub worker_id: WorkerId,
    pub from_date: String,
    pub to_date: String,
    pub salary: Decimal,
}

/// Embedded worker reference; fields the route did not populate are `None`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerRef {
    pub id: WorkerId,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<WorkerRole>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MachineView {
    pub index: u8,
    pub product: ProductRef,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerloomEntry {
    pub id: PowerloomEntryId,
    pub loom_number: u8,
    pub date: DateTime<Utc>,
    pub worker: WorkerRef,
    pub machines: Vec<MachineView>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogEntry {
    pub id: ExportLogId,
    pub worker: WorkerRef,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub salary: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct Revenue {
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeletedCount {
    pub deleted_count: u64,
}
