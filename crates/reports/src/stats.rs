//! Grouped summaries behind the `/stats/summary` endpoints.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use loomworks_core::WorkerId;
use loomworks_expenses::{Expense, ExpenseType};
use loomworks_production::{ProductionRecord, Shift};
use loomworks_workers::Worker;

use crate::error::{self as checked, ReportError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseTypeStat {
    #[serde(rename = "_id")]
    pub expense_type: ExpenseType,
    pub total: Decimal,
    pub count: usize,
    pub average_amount: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseTotals {
    pub total_amount: Decimal,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseStats {
    pub by_type: Vec<ExpenseTypeStat>,
    pub summary: ExpenseTotals,
}

/// Group expenses by type, largest total first.
pub fn expense_stats<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Result<ExpenseStats, ReportError> {
    let mut groups: HashMap<ExpenseType, (Decimal, usize)> = HashMap::new();
    let mut summary = ExpenseTotals::default();

    for expense in expenses {
        let slot = groups.entry(expense.expense_type).or_default();
        slot.0 = checked::add(slot.0, expense.amount, "expense type total")?;
        slot.1 += 1;
        summary.total_amount = checked::add(summary.total_amount, expense.amount, "expense total")?;
        summary.total_count += 1;
    }

    let mut by_type: Vec<ExpenseTypeStat> = groups
        .into_iter()
        .map(|(expense_type, (total, count))| ExpenseTypeStat {
            expense_type,
            total,
            count,
            average_amount: average(total, count),
        })
        .collect();
    sort_desc_by(&mut by_type, |s| (s.total, s.expense_type));

    Ok(ExpenseStats { by_type, summary })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStat {
    #[serde(rename = "_id")]
    pub shift: Shift,
    pub total_quantity: Decimal,
    pub total_wastage: Decimal,
    pub count: usize,
    pub average_quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStat {
    #[serde(rename = "_id")]
    pub worker: WorkerId,
    pub total_quantity: Decimal,
    pub total_wastage: Decimal,
    pub count: usize,
    pub worker_info: Worker,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallProductionStats {
    pub total_quantity: Decimal,
    pub total_wastage: Decimal,
    pub total_records: usize,
    pub average_quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionStats {
    pub by_shift: Vec<ShiftStat>,
    pub by_worker: Vec<WorkerStat>,
    pub overall: OverallProductionStats,
}

#[derive(Default, Clone, Copy)]
struct Tally {
    quantity: Decimal,
    wastage: Decimal,
    count: usize,
}

impl Tally {
    fn add(&mut self, record: &ProductionRecord) -> Result<(), ReportError> {
        self.quantity = checked::add(self.quantity, record.quantity_produced, "produced quantity")?;
        self.wastage = checked::add(self.wastage, record.wastage, "wastage")?;
        self.count += 1;
        Ok(())
    }
}

/// Group shift records by shift and by worker.
///
/// Workers are looked up in `workers`; groups whose worker no longer exists
/// are dropped from `by_worker` but still count towards the other groupings.
pub fn production_stats<'a>(
    records: impl IntoIterator<Item = &'a ProductionRecord>,
    workers: &[Worker],
) -> Result<ProductionStats, ReportError> {
    let mut shifts: HashMap<Shift, Tally> = HashMap::new();
    let mut per_worker: HashMap<WorkerId, Tally> = HashMap::new();
    let mut overall = Tally::default();

    for record in records {
        shifts.entry(record.shift).or_default().add(record)?;
        per_worker.entry(record.worker).or_default().add(record)?;
        overall.add(record)?;
    }

    let mut by_shift: Vec<ShiftStat> = shifts
        .into_iter()
        .map(|(shift, t)| ShiftStat {
            shift,
            total_quantity: t.quantity,
            total_wastage: t.wastage,
            count: t.count,
            average_quantity: average(t.quantity, t.count),
        })
        .collect();
    sort_desc_by(&mut by_shift, |s| (s.total_quantity, s.shift));

    let directory: HashMap<WorkerId, &Worker> = workers.iter().map(|w| (w.id, w)).collect();
    let mut by_worker: Vec<WorkerStat> = per_worker
        .into_iter()
        .filter_map(|(worker, t)| {
            directory.get(&worker).map(|info| WorkerStat {
                worker,
                total_quantity: t.quantity,
                total_wastage: t.wastage,
                count: t.count,
                worker_info: (*info).clone(),
            })
        })
        .collect();
    sort_desc_by(&mut by_worker, |s| (s.total_quantity, s.worker));

    Ok(ProductionStats {
        by_shift,
        by_worker,
        overall: OverallProductionStats {
            total_quantity: overall.quantity,
            total_wastage: overall.wastage,
            total_records: overall.count,
            average_quantity: average(overall.quantity, overall.count),
        },
    })
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sort descending by key; the key includes a tiebreaker so output is stable
/// across hash orders.
fn sort_desc_by<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}
