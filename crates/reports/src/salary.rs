//! Loom-operator salary aggregation.
//!
//! Quantities are grouped product → day → machine slot. Each product's
//! per-machine column totals are multiplied by its worker rate; the grand
//! total is the sum over every product and machine.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use loomworks_core::{DateRange, ProductId, WorkerId};
use loomworks_production::PowerloomProduction;
use loomworks_products::Product;

use crate::error::{self as checked, ReportError};

const UNKNOWN_PRODUCT: &str = "Unknown";

/// Rate applied to quantities of a product that has been deactivated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InactiveProductRate {
    /// Deactivated products pay nothing.
    #[default]
    Zero,
    /// Deactivated products keep paying their stored rate.
    Stored,
}

impl FromStr for InactiveProductRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(InactiveProductRate::Zero),
            "stored" => Ok(InactiveProductRate::Stored),
            other => Err(format!("expected `zero` or `stored`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryPolicy {
    pub inactive_product_rate: InactiveProductRate,
}

impl SalaryPolicy {
    fn rate_for(&self, product: Option<&Product>) -> Decimal {
        match product {
            None => Decimal::ZERO,
            Some(p) if p.is_active => p.worker_salary,
            Some(p) => match self.inactive_product_rate {
                InactiveProductRate::Zero => Decimal::ZERO,
                InactiveProductRate::Stored => p.worker_salary,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineQuantity {
    pub index: u8,
    pub quantity: Decimal,
}

/// One day of a product table. Only machines with a positive quantity appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRow {
    pub date: NaiveDate,
    pub machines: Vec<MachineQuantity>,
}

/// Column footer: summed quantity for one machine and what it pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSalary {
    pub index: u8,
    pub quantity: Decimal,
    /// `quantity × rate`, rounded to 2 decimal places.
    pub salary: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSalaryTable {
    pub product_id: ProductId,
    pub product_name: String,
    pub rate: Decimal,
    /// Machine slots with any positive quantity, ascending.
    pub machines: Vec<u8>,
    /// Rows ordered by date ascending.
    pub rows: Vec<SalaryRow>,
    pub salary_row: Vec<MachineSalary>,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryReport {
    pub worker_id: WorkerId,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Ordered by product name.
    pub products: Vec<ProductSalaryTable>,
    /// Grand total at 2 decimal places.
    pub total_salary: Decimal,
    /// Grand total rounded to whole currency units.
    pub rounded_total: Decimal,
}

impl SalaryReport {
    /// Every day that contributes to any product, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.products
            .iter()
            .flat_map(|p| p.rows.iter().map(|r| r.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

type DayGrid = BTreeMap<NaiveDate, BTreeMap<u8, Decimal>>;

/// Build the salary report for `worker` from every powerloom entry.
///
/// `products` should be the full catalog including deactivated products so
/// that `policy` can decide their rate. Fails only when a total leaves the
/// representable range.
pub fn compute_salary_report(
    entries: &[PowerloomProduction],
    products: &[Product],
    worker: WorkerId,
    range: DateRange,
    policy: SalaryPolicy,
) -> Result<SalaryReport, ReportError> {
    let mut grid: HashMap<ProductId, DayGrid> = HashMap::new();

    for entry in entries
        .iter()
        .filter(|e| e.worker == worker && range.contains(e.date))
    {
        let day = entry.date.date_naive();
        for slot in entry.machines.iter().filter(|m| m.quantity > Decimal::ZERO) {
            let cell = grid
                .entry(slot.product)
                .or_default()
                .entry(day)
                .or_default()
                .entry(slot.index)
                .or_insert(Decimal::ZERO);
            *cell = checked::add(*cell, slot.quantity, "machine quantity")?;
        }
    }

    let catalog: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut tables: Vec<ProductSalaryTable> = Vec::with_capacity(grid.len());
    let mut total = Decimal::ZERO;

    for (product_id, days) in grid {
        let product = catalog.get(&product_id).copied();
        let rate = policy.rate_for(product);
        let product_name = product.map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone());

        let mut column_totals: BTreeMap<u8, Decimal> = BTreeMap::new();
        let mut rows: Vec<SalaryRow> = Vec::with_capacity(days.len());
        for (date, by_machine) in days {
            let mut machines = Vec::with_capacity(by_machine.len());
            for (index, quantity) in by_machine {
                let column = column_totals.entry(index).or_insert(Decimal::ZERO);
                *column = checked::add(*column, quantity, "machine column total")?;
                machines.push(MachineQuantity { index, quantity });
            }
            rows.push(SalaryRow { date, machines });
        }

        if rows.is_empty() {
            continue;
        }

        let mut subtotal = Decimal::ZERO;
        let mut salary_row: Vec<MachineSalary> = Vec::with_capacity(column_totals.len());
        for (&index, &quantity) in &column_totals {
            let raw = checked::mul(quantity, rate, "machine salary")?;
            subtotal = checked::add(subtotal, raw, "product subtotal")?;
            salary_row.push(MachineSalary {
                index,
                quantity,
                salary: round_cents(raw),
            });
        }
        total = checked::add(total, subtotal, "total salary")?;

        tables.push(ProductSalaryTable {
            product_id,
            product_name,
            rate,
            machines: column_totals.keys().copied().collect(),
            rows,
            salary_row,
            subtotal: round_cents(subtotal),
        });
    }

    tables.sort_by(|a, b| {
        a.product_name
            .cmp(&b.product_name)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    let total_salary = round_cents(total);
    Ok(SalaryReport {
        worker_id: worker,
        from: range.from,
        to: range.to,
        products: tables,
        total_salary,
        rounded_total: total_salary.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
    })
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
