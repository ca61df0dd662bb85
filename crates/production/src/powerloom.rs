use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{
    parse_date, DomainError, DomainResult, Entity, LoomNumber, PowerloomEntryId, ProductId, WorkerId, MAX_AMOUNT,
};

/// Quantity produced on one machine slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineEntry {
    /// 1-based slot index, bounded by the loom's machine count.
    pub index: u8,
    pub product: ProductId,
    pub quantity: Decimal,
}

/// Daily production of one worker on one loom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerloomProduction {
    pub id: PowerloomEntryId,
    pub loom_number: LoomNumber,
    pub date: DateTime<Utc>,
    pub worker: WorkerId,
    pub machines: Vec<MachineEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for PowerloomProduction {
    type Id = PowerloomEntryId;
    const KIND: &'static str = "Powerloom production";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMachineEntry {
    pub index: Option<i64>,
    pub product: Option<String>,
    pub quantity: Option<Decimal>,
}

/// Raw creation payload. Checks run in a fixed order and stop at the first
/// failure, so the client sees exactly one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPowerloomProduction {
    pub loom_number: Option<i64>,
    pub date: Option<String>,
    pub worker: Option<String>,
    pub machines: Option<Vec<NewMachineEntry>>,
}

impl PowerloomProduction {
    pub fn create(
        id: PowerloomEntryId,
        input: NewPowerloomProduction,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let loom_number = input
            .loom_number
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| DomainError::validation("Invalid loom number"))
            .and_then(LoomNumber::try_from)?;

        let (raw_date, raw_worker) = match (non_blank(input.date.as_deref()), non_blank(input.worker.as_deref())) {
            (Some(d), Some(w)) => (d, w),
            _ => return Err(DomainError::validation("Date and worker are required")),
        };
        let worker = WorkerId::from_str(raw_worker)
            .map_err(|_| DomainError::validation("Invalid worker id"))?;

        let raw_machines = input.machines.unwrap_or_default();
        if raw_machines.is_empty() {
            return Err(DomainError::validation("At least one machine entry is required"));
        }
        let machines = raw_machines
            .into_iter()
            .map(|m| validate_machine(loom_number, m))
            .collect::<DomainResult<Vec<_>>>()?;

        let date = parse_date(raw_date)?;

        Ok(Self {
            id,
            loom_number,
            date,
            worker,
            machines,
            created_at: now,
            updated_at: now,
        })
    }

    /// Listing order: by production date, then by insertion time.
    pub fn sort_chronologically(entries: &mut [PowerloomProduction]) {
        entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
    }
}

fn validate_machine(loom: LoomNumber, raw: NewMachineEntry) -> DomainResult<MachineEntry> {
    let max = loom.machine_count();
    let index = raw
        .index
        .and_then(|i| u8::try_from(i).ok())
        .filter(|i| loom.accepts_machine(*i))
        .ok_or_else(|| {
            DomainError::validation(format!("Machine index must be between 1 and {max} for loom {loom}"))
        })?;

    let raw_product = non_blank(raw.product.as_deref())
        .ok_or_else(|| DomainError::validation("Product is required for each machine entry"))?;
    let product = ProductId::from_str(raw_product)
        .map_err(|_| DomainError::validation(format!("Invalid product id for machine {index}")))?;

    let quantity = raw
        .quantity
        .filter(|q| !q.is_sign_negative() || q.is_zero())
        .ok_or_else(|| DomainError::validation("Quantity must be a non-negative number"))?;
    if quantity > MAX_AMOUNT {
        return Err(DomainError::validation(format!("Quantity for machine {index} is too large")));
    }

    Ok(MachineEntry {
        index,
        product,
        quantity,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// `?loom=` filter. Anything other than 1, 2 or 3 means "all looms".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerloomFilter {
    pub loom: Option<LoomNumber>,
}

impl PowerloomFilter {
    pub fn from_query(loom: Option<&str>) -> Self {
        let loom = loom
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .and_then(|n| LoomNumber::try_from(n).ok());
        Self { loom }
    }

    pub fn matches(&self, entry: &PowerloomProduction) -> bool {
        self.loom.is_none_or(|l| l == entry.loom_number)
    }
}
