//! Week-by-week profit trend.
//!
//! Revenue is a single figure with no dates, so it is spread evenly over the
//! weeks that have expenses: after week N of W the cumulative revenue share is
//! `revenue × N / W`, and profit is that share minus cumulative expenses.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use loomworks_expenses::Expense;

use crate::error::{self as checked, ReportError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProfitPoint {
    /// ISO week key, `YYYY-Www`.
    pub key: String,
    /// `Week N`, 1-based position in the series.
    pub label: String,
    pub week_expenses: Decimal,
    pub cumulative_expenses: Decimal,
    pub revenue_share: Decimal,
    pub profit_loss: Decimal,
}

/// Bucket `expenses` by ISO week (UTC) and compute the cumulative profit series.
pub fn weekly_profit(expenses: &[Expense], total_revenue: Decimal) -> Result<Vec<WeeklyProfitPoint>, ReportError> {
    let mut buckets: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for expense in expenses {
        let week = expense.date.iso_week();
        let bucket = buckets.entry((week.year(), week.week())).or_insert(Decimal::ZERO);
        *bucket = checked::add(*bucket, expense.amount, "weekly expenses")?;
    }

    let total_weeks = Decimal::from(buckets.len());
    let mut cumulative = Decimal::ZERO;
    let mut points = Vec::with_capacity(buckets.len());

    for (i, ((year, week), amount)) in buckets.into_iter().enumerate() {
        cumulative = checked::add(cumulative, amount, "cumulative expenses")?;
        let allocated = checked::mul(total_revenue, Decimal::from(i + 1), "revenue share")?;
        let share = round_cents(checked::div(allocated, total_weeks, "revenue share")?);
        points.push(WeeklyProfitPoint {
            key: format!("{year}-W{week:02}"),
            label: format!("Week {}", i + 1),
            week_expenses: amount,
            cumulative_expenses: cumulative,
            revenue_share: share,
            profit_loss: checked::sub(share, cumulative, "weekly profit")?,
        });
    }
    Ok(points)
}

/// Headline numbers for the reports page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
    /// Percentage of revenue kept as profit; 0 when there is no revenue.
    pub profit_margin: Decimal,
}

impl FinancialSummary {
    pub fn compute(expenses: &[Expense], total_revenue: Decimal) -> Result<Self, ReportError> {
        let total_expenses = expenses
            .iter()
            .try_fold(Decimal::ZERO, |sum, e| checked::add(sum, e.amount, "total expenses"))?;
        let net_profit = checked::sub(total_revenue, total_expenses, "net profit")?;
        let profit_margin = if total_revenue.is_zero() {
            Decimal::ZERO
        } else {
            let ratio = checked::div(net_profit, total_revenue, "profit margin")?;
            round_cents(checked::mul(ratio, Decimal::ONE_HUNDRED, "profit margin")?)
        };
        Ok(Self {
            total_revenue,
            total_expenses,
            net_profit,
            profit_margin,
        })
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
