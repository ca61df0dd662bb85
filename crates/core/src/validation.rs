//! Field-level validation helpers.
//!
//! Validators collect every failing field instead of stopping at the first one;
//! the messages surface to clients as a single comma-joined string.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Largest amount, rate or quantity accepted from clients (10^12). Report
/// totals built from values under this bound stay inside `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Accumulates field validation messages.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    messages: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Record `message` unless `ok` holds.
    pub fn ensure(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.push(message);
        }
    }

    /// Trim `value`, require it to be non-empty and at most `max_chars` long.
    ///
    /// Returns the trimmed value so callers can store it.
    pub fn required_text(
        &mut self,
        value: &str,
        max_chars: usize,
        required_msg: &str,
        too_long_msg: &str,
    ) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(required_msg);
        } else if trimmed.chars().count() > max_chars {
            self.push(too_long_msg);
        }
        trimmed.to_string()
    }

    /// Trim an optional free-text field and enforce its length.
    pub fn optional_text(
        &mut self,
        value: Option<&str>,
        max_chars: usize,
        too_long_msg: &str,
    ) -> Option<String> {
        let trimmed = value?.trim();
        if trimmed.chars().count() > max_chars {
            self.push(too_long_msg);
        }
        Some(trimmed.to_string())
    }

    /// Require `0 <= value <= MAX_AMOUNT`, with one message per side.
    pub fn amount(&mut self, value: Decimal, negative_msg: &str, too_large_msg: &str) {
        if value.is_sign_negative() && !value.is_zero() {
            self.push(negative_msg);
        } else if value > MAX_AMOUNT {
            self.push(too_large_msg);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_result(self) -> DomainResult<()> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.messages.join(", ")))
        }
    }
}
