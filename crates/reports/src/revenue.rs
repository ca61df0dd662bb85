use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{DomainError, DomainResult, MAX_AMOUNT};

/// Settings key holding the single revenue figure.
pub const TOTAL_REVENUE_KEY: &str = "totalRevenue";

/// Keyed numeric setting. Only total revenue is stored today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSetting {
    pub key: String,
    pub value: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl RevenueSetting {
    pub fn total_revenue(value: Decimal, now: DateTime<Utc>) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation("Value must be a non-negative number"));
        }
        if value > MAX_AMOUNT {
            return Err(DomainError::validation(format!("Value cannot exceed {MAX_AMOUNT}")));
        }
        Ok(Self {
            key: TOTAL_REVENUE_KEY.to_string(),
            value,
            updated_at: now,
        })
    }
}
