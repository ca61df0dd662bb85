use rust_decimal::Decimal;
use thiserror::Error;

/// Failures while computing a report or rendering it into an export format.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A running total left the range `Decimal` can represent.
    #[error("{0} overflowed")]
    Overflow(&'static str),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("export encoding failed: {0}")]
    Encoding(String),
}

pub(crate) fn add(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ReportError> {
    a.checked_add(b).ok_or(ReportError::Overflow(what))
}

pub(crate) fn sub(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ReportError> {
    a.checked_sub(b).ok_or(ReportError::Overflow(what))
}

pub(crate) fn mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ReportError> {
    a.checked_mul(b).ok_or(ReportError::Overflow(what))
}

/// `b` must be non-zero; callers guard the empty case themselves.
pub(crate) fn div(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ReportError> {
    a.checked_div(b).ok_or(ReportError::Overflow(what))
}
