use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{parse_date, DateRange, DomainError, DomainResult, Entity, ExpenseId, FieldErrors};

const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseType {
    #[serde(rename = "Raw Materials")]
    RawMaterials,
    Equipment,
    Utilities,
    Labor,
    Maintenance,
    Transport,
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
    Salary,
    Other,
}

impl ExpenseType {
    pub const ALL: [ExpenseType; 9] = [
        ExpenseType::RawMaterials,
        ExpenseType::Equipment,
        ExpenseType::Utilities,
        ExpenseType::Labor,
        ExpenseType::Maintenance,
        ExpenseType::Transport,
        ExpenseType::OfficeSupplies,
        ExpenseType::Salary,
        ExpenseType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseType::RawMaterials => "Raw Materials",
            ExpenseType::Equipment => "Equipment",
            ExpenseType::Utilities => "Utilities",
            ExpenseType::Labor => "Labor",
            ExpenseType::Maintenance => "Maintenance",
            ExpenseType::Transport => "Transport",
            ExpenseType::OfficeSupplies => "Office Supplies",
            ExpenseType::Salary => "Salary",
            ExpenseType::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Fixed,
    #[default]
    Variable,
    #[serde(rename = "One-time")]
    OneTime,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseCategory::Fixed => "Fixed",
            ExpenseCategory::Variable => "Variable",
            ExpenseCategory::OneTime => "One-time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Fixed" => Some(ExpenseCategory::Fixed),
            "Variable" => Some(ExpenseCategory::Variable),
            "One-time" => Some(ExpenseCategory::OneTime),
            _ => None,
        }
    }
}

/// Business expense. Hard-deleted, unlike workers and products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub category: ExpenseCategory,
    pub receipt: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Expense {
    type Id = ExpenseId;
    const KIND: &'static str = "Expense";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewExpense {
    pub expense_type: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub receipt: Option<String>,
    pub is_approved: Option<bool>,
}

/// Partial update. `Some(None)` on `description`/`receipt` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub expense_type: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub receipt: Option<Option<String>>,
    pub is_approved: Option<bool>,
}

impl Expense {
    pub fn create(id: ExpenseId, input: NewExpense, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        let expense_type = match input.expense_type.as_deref() {
            Some(raw) if !raw.trim().is_empty() => validate_type(&mut errors, raw),
            _ => {
                errors.push("Expense type is required");
                ExpenseType::Other
            }
        };
        let amount = match input.amount {
            Some(amount) => {
                errors.amount(amount, "Amount cannot be negative", "Amount is too large");
                amount
            }
            None => {
                errors.push("Amount is required");
                Decimal::ZERO
            }
        };
        let date = match input.date.as_deref() {
            None => now,
            Some(raw) => validate_date(&mut errors, raw, now),
        };
        let description = errors.optional_text(
            input.description.as_deref(),
            DESCRIPTION_MAX,
            "Description cannot exceed 500 characters",
        );
        let category = match input.category.as_deref() {
            None => ExpenseCategory::default(),
            Some(raw) => validate_category(&mut errors, raw),
        };

        errors.into_result()?;

        Ok(Self {
            id,
            expense_type,
            amount,
            date,
            description,
            category,
            receipt: input.receipt,
            is_approved: input.is_approved.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. On validation failure the expense is left untouched.
    pub fn apply_patch(&mut self, patch: ExpensePatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        let mut next = self.clone();

        if let Some(raw) = patch.expense_type {
            next.expense_type = validate_type(&mut errors, &raw);
        }
        if let Some(amount) = patch.amount {
            errors.amount(amount, "Amount cannot be negative", "Amount is too large");
            next.amount = amount;
        }
        if let Some(raw) = patch.date {
            next.date = validate_date(&mut errors, &raw, next.date);
        }
        if let Some(description) = patch.description {
            next.description = errors.optional_text(
                description.as_deref(),
                DESCRIPTION_MAX,
                "Description cannot exceed 500 characters",
            );
        }
        if let Some(raw) = patch.category {
            next.category = validate_category(&mut errors, &raw);
        }
        if let Some(receipt) = patch.receipt {
            next.receipt = receipt;
        }
        if let Some(approved) = patch.is_approved {
            next.is_approved = approved;
        }

        errors.into_result()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Newest first, the order every expense listing uses.
    pub fn sort_newest_first(expenses: &mut [Expense]) {
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    }
}

fn validate_type(errors: &mut FieldErrors, raw: &str) -> ExpenseType {
    ExpenseType::parse(raw).unwrap_or_else(|| {
        errors.push("Please select a valid expense type");
        ExpenseType::Other
    })
}

fn validate_category(errors: &mut FieldErrors, raw: &str) -> ExpenseCategory {
    ExpenseCategory::parse(raw).unwrap_or_else(|| {
        errors.push("Please select a valid category");
        ExpenseCategory::default()
    })
}

fn validate_date(errors: &mut FieldErrors, raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    parse_date(raw).unwrap_or_else(|_| {
        errors.push("Invalid date format");
        fallback
    })
}

/// Listing filter for `GET /api/expenses`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub range: DateRange,
    pub expense_type: Option<ExpenseType>,
    pub category: Option<ExpenseCategory>,
}

impl ExpenseFilter {
    /// Build a filter from raw query values. Empty strings count as absent.
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        expense_type: Option<&str>,
        category: Option<&str>,
    ) -> DomainResult<Self> {
        let range = DateRange::parse(start_date, end_date)?;
        let expense_type = non_empty(expense_type)
            .map(|raw| {
                ExpenseType::parse(raw)
                    .ok_or_else(|| DomainError::validation("Please select a valid expense type"))
            })
            .transpose()?;
        let category = non_empty(category)
            .map(|raw| {
                ExpenseCategory::parse(raw)
                    .ok_or_else(|| DomainError::validation("Please select a valid category"))
            })
            .transpose()?;
        Ok(Self {
            range,
            expense_type,
            category,
        })
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        self.range.contains(expense.date)
            && self.expense_type.is_none_or(|t| t == expense.expense_type)
            && self.category.is_none_or(|c| c == expense.category)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomworks_core::MAX_AMOUNT;

    fn input(kind: &str, amount: i64) -> NewExpense {
        NewExpense {
            expense_type: Some(kind.to_string()),
            amount: Some(Decimal::new(amount, 0)),
            ..NewExpense::default()
        }
    }

    #[test]
    fn create_applies_defaults() {
        let now = Utc::now();
        let expense = Expense::create(ExpenseId::new(), input("Raw Materials", 2500), now).unwrap();
        assert_eq!(expense.expense_type, ExpenseType::RawMaterials);
        assert_eq!(expense.category, ExpenseCategory::Variable);
        assert!(expense.is_approved);
        assert_eq!(expense.date, now);
    }

    #[test]
    fn create_requires_type_and_amount() {
        let err = Expense::create(ExpenseId::new(), NewExpense::default(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Expense type is required, Amount is required")
        );
    }

    #[test]
    fn create_rejects_unknown_type_and_negative_amount() {
        let err = Expense::create(ExpenseId::new(), input("Snacks", -10), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Please select a valid expense type, Amount cannot be negative")
        );
    }

    #[test]
    fn create_rejects_amounts_above_the_cap() {
        let input = NewExpense {
            amount: Some(MAX_AMOUNT + Decimal::ONE),
            ..input("Utilities", 0)
        };
        let err = Expense::create(ExpenseId::new(), input, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("Amount is too large"));
    }

    #[test]
    fn create_rejects_long_description_and_bad_date() {
        let err = Expense::create(
            ExpenseId::new(),
            NewExpense {
                description: Some("x".repeat(501)),
                date: Some("31/01/2024".to_string()),
                ..input("Utilities", 10)
            },
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Invalid date format, Description cannot exceed 500 characters")
        );
    }

    #[test]
    fn patch_is_atomic_on_failure() {
        let mut expense = Expense::create(ExpenseId::new(), input("Labor", 100), Utc::now()).unwrap();
        let before = expense.clone();
        let result = expense.apply_patch(
            ExpensePatch {
                amount: Some(Decimal::new(50, 0)),
                category: Some("Monthly".to_string()),
                ..ExpensePatch::default()
            },
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(expense, before);
    }

    #[test]
    fn patch_updates_fields() {
        let mut expense = Expense::create(ExpenseId::new(), input("Labor", 100), Utc::now()).unwrap();
        expense
            .apply_patch(
                ExpensePatch {
                    category: Some("One-time".to_string()),
                    date: Some("2024-05-01".to_string()),
                    is_approved: Some(false),
                    ..ExpensePatch::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(expense.category, ExpenseCategory::OneTime);
        assert_eq!(expense.date, parse_date("2024-05-01").unwrap());
        assert!(!expense.is_approved);
    }

    #[test]
    fn filter_matches_type_category_and_range() {
        let now = Utc::now();
        let expense = Expense::create(
            ExpenseId::new(),
            NewExpense {
                date: Some("2024-03-10".to_string()),
                category: Some("Fixed".to_string()),
                ..input("Transport", 40)
            },
            now,
        )
        .unwrap();

        let hit = ExpenseFilter::parse(Some("2024-03-10"), Some("2024-03-10"), Some("Transport"), Some("Fixed"))
            .unwrap();
        assert!(hit.matches(&expense));

        let wrong_type = ExpenseFilter::parse(None, None, Some("Salary"), None).unwrap();
        assert!(!wrong_type.matches(&expense));

        let out_of_range = ExpenseFilter::parse(Some("2024-03-11"), None, None, Some("")).unwrap();
        assert!(!out_of_range.matches(&expense));
    }

    #[test]
    fn filter_rejects_unknown_values() {
        assert!(ExpenseFilter::parse(None, None, Some("Snacks"), None).is_err());
        assert!(ExpenseFilter::parse(None, None, None, Some("Monthly")).is_err());
    }

    #[test]
    fn sorts_newest_first() {
        let now = Utc::now();
        let mut expenses: Vec<Expense> = ["2024-01-01", "2024-03-01", "2024-02-01"]
            .into_iter()
            .map(|d| {
                Expense::create(
                    ExpenseId::new(),
                    NewExpense {
                        date: Some(d.to_string()),
                        ..input("Other", 1)
                    },
                    now,
                )
                .unwrap()
            })
            .collect();
        Expense::sort_newest_first(&mut expenses);
        let days: Vec<String> = expenses.iter().map(|e| e.date.format("%Y-%m-%d").to_string()).collect();
        assert_eq!(days, ["2024-03-01", "2024-02-01", "2024-01-01"]);
    }

    #[test]
    fn types_serialize_with_display_names() {
        assert_eq!(
            serde_json::to_string(&ExpenseType::OfficeSupplies).unwrap(),
            "\"Office Supplies\""
        );
        assert_eq!(serde_json::to_string(&ExpenseCategory::OneTime).unwrap(), "\"One-time\"");
    }
}
