use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{parse_date, DomainResult, Entity, FieldErrors, LoomNumber, WorkerId};

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]{10,}$").expect("phone pattern is valid"));

const NAME_MAX: usize = 100;
const NOTES_MAX: usize = 500;

/// Role of a worker within the workshop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerRole {
    #[default]
    #[serde(rename = "Loom Operator")]
    LoomOperator,
    Mechanic,
    Loader,
}

impl WorkerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerRole::LoomOperator => "Loom Operator",
            WorkerRole::Mechanic => "Mechanic",
            WorkerRole::Loader => "Loader",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Loom Operator" => Some(WorkerRole::LoomOperator),
            "Mechanic" => Some(WorkerRole::Mechanic),
            "Loader" => Some(WorkerRole::Loader),
            _ => None,
        }
    }
}

/// How a worker's pay is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryBasis {
    /// Paid per unit produced (loom operators).
    Production,
    /// Paid the flat amount stored on the worker record.
    Fixed(Decimal),
}

/// Worker record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub phone: String,
    pub power_loom_number: LoomNumber,
    pub role: WorkerRole,
    pub salary: Option<Decimal>,
    pub is_active: bool,
    pub hire_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Worker {
    type Id = WorkerId;
    const KIND: &'static str = "Worker";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a worker. Enumerated fields arrive as raw client values
/// and are checked during validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewWorker {
    pub name: String,
    pub phone: String,
    pub power_loom_number: Option<u8>,
    pub role: Option<String>,
    pub salary: Option<Decimal>,
    pub hire_date: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. `salary: Some(None)` clears the stored salary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub power_loom_number: Option<u8>,
    pub role: Option<String>,
    pub salary: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
    pub hire_date: Option<String>,
    pub notes: Option<Option<String>>,
}

impl Worker {
    /// Validate `input` and build a new active worker.
    pub fn create(id: WorkerId, input: NewWorker, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        let name = errors.required_text(
            &input.name,
            NAME_MAX,
            "Worker name is required",
            "Name cannot exceed 100 characters",
        );
        let phone = validate_phone(&mut errors, &input.phone);
        let power_loom_number = validate_loom(&mut errors, input.power_loom_number.unwrap_or(1));
        let role = match input.role.as_deref() {
            None => WorkerRole::default(),
            Some(raw) => validate_role(&mut errors, raw),
        };
        if let Some(salary) = input.salary {
            errors.amount(salary, "Salary cannot be negative", "Salary is too large");
        }
        let hire_date = match input.hire_date.as_deref() {
            None => now,
            Some(raw) => parse_date(raw).unwrap_or_else(|_| {
                errors.push("Invalid hire date");
                now
            }),
        };
        let notes = errors.optional_text(
            input.notes.as_deref(),
            NOTES_MAX,
            "Notes cannot exceed 500 characters",
        );

        errors.into_result()?;

        Ok(Self {
            id,
            name,
            phone,
            power_loom_number,
            role,
            salary: input.salary,
            is_active: true,
            hire_date,
            notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. On validation failure the worker is left untouched.
    pub fn apply_patch(&mut self, patch: WorkerPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        let mut next = self.clone();

        if let Some(name) = patch.name {
            next.name = errors.required_text(
                &name,
                NAME_MAX,
                "Worker name is required",
                "Name cannot exceed 100 characters",
            );
        }
        if let Some(phone) = patch.phone {
            next.phone = validate_phone(&mut errors, &phone);
        }
        if let Some(loom) = patch.power_loom_number {
            next.power_loom_number = validate_loom(&mut errors, loom);
        }
        if let Some(role) = patch.role {
            next.role = validate_role(&mut errors, &role);
        }
        if let Some(salary) = patch.salary {
            if let Some(amount) = salary {
                errors.amount(amount, "Salary cannot be negative", "Salary is too large");
            }
            next.salary = salary;
        }
        if let Some(active) = patch.is_active {
            next.is_active = active;
        }
        if let Some(raw) = patch.hire_date {
            match parse_date(&raw) {
                Ok(d) => next.hire_date = d,
                Err(_) => errors.push("Invalid hire date"),
            }
        }
        if let Some(notes) = patch.notes {
            next.notes = match notes {
                Some(n) => errors.optional_text(Some(&n), NOTES_MAX, "Notes cannot exceed 500 characters"),
                None => None,
            };
        }

        errors.into_result()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Soft delete.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    pub fn salary_basis(&self) -> SalaryBasis {
        match self.role {
            WorkerRole::LoomOperator => SalaryBasis::Production,
            WorkerRole::Mechanic | WorkerRole::Loader => {
                SalaryBasis::Fixed(self.salary.unwrap_or(Decimal::ZERO))
            }
        }
    }
}

fn validate_phone(errors: &mut FieldErrors, raw: &str) -> String {
    let phone = raw.trim();
    if phone.is_empty() {
        errors.push("Phone number is required");
    } else if !PHONE_PATTERN.is_match(phone) {
        errors.push("Please enter a valid phone number");
    }
    phone.to_string()
}

fn validate_loom(errors: &mut FieldErrors, raw: u8) -> LoomNumber {
    LoomNumber::try_from(raw).unwrap_or_else(|_| {
        errors.push("Power loom number must be 1, 2 or 3");
        LoomNumber::One
    })
}

fn validate_role(errors: &mut FieldErrors, raw: &str) -> WorkerRole {
    WorkerRole::parse(raw).unwrap_or_else(|| {
        errors.push("Please select a valid role");
        WorkerRole::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomworks_core::DomainError;

    fn valid_input() -> NewWorker {
        NewWorker {
            name: "  Ravi Kumar ".to_string(),
            phone: "+91 98765 43210".to_string(),
            ..NewWorker::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_trims() {
        let now = Utc::now();
        let worker = Worker::create(WorkerId::new(), valid_input(), now).unwrap();

        assert_eq!(worker.name, "Ravi Kumar");
        assert_eq!(worker.power_loom_number, LoomNumber::One);
        assert_eq!(worker.role, WorkerRole::LoomOperator);
        assert!(worker.is_active);
        assert_eq!(worker.hire_date, now);
        assert_eq!(worker.created_at, worker.updated_at);
    }

    #[test]
    fn create_reports_every_invalid_field() {
        let input = NewWorker {
            name: "   ".to_string(),
            phone: "12-34".to_string(),
            power_loom_number: Some(4),
            role: Some("Weaver".to_string()),
            ..NewWorker::default()
        };

        let err = Worker::create(WorkerId::new(), input, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(
                "Worker name is required, Please enter a valid phone number, \
                 Power loom number must be 1, 2 or 3, Please select a valid role"
                    .to_string()
            )
        );
    }

    #[test]
    fn create_rejects_flat_salary_above_the_cap() {
        let input = NewWorker {
            role: Some("Mechanic".to_string()),
            salary: Some(loomworks_core::MAX_AMOUNT + Decimal::ONE),
            ..valid_input()
        };
        let err = Worker::create(WorkerId::new(), input, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("Salary is too large"));
    }

    #[test]
    fn create_rejects_missing_phone() {
        let input = NewWorker {
            phone: String::new(),
            ..valid_input()
        };
        let err = Worker::create(WorkerId::new(), input, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("Phone number is required"));
    }

    #[test]
    fn patch_is_atomic_on_failure() {
        let mut worker = Worker::create(WorkerId::new(), valid_input(), Utc::now()).unwrap();
        let before = worker.clone();

        let patch = WorkerPatch {
            name: Some("Suresh".to_string()),
            salary: Some(Some(Decimal::new(-5, 0))),
            ..WorkerPatch::default()
        };

        assert!(worker.apply_patch(patch, Utc::now()).is_err());
        assert_eq!(worker, before);
    }

    #[test]
    fn patch_updates_role_and_clears_salary() {
        let mut worker = Worker::create(
            WorkerId::new(),
            NewWorker {
                role: Some("Mechanic".to_string()),
                salary: Some(Decimal::new(12000, 0)),
                ..valid_input()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(worker.salary_basis(), SalaryBasis::Fixed(Decimal::new(12000, 0)));

        worker
            .apply_patch(
                WorkerPatch {
                    role: Some("Loader".to_string()),
                    salary: Some(None),
                    ..WorkerPatch::default()
                },
                Utc::now(),
            )
            .unwrap();

        assert_eq!(worker.role, WorkerRole::Loader);
        assert_eq!(worker.salary_basis(), SalaryBasis::Fixed(Decimal::ZERO));
    }

    #[test]
    fn loom_operators_are_paid_by_production() {
        let worker = Worker::create(WorkerId::new(), valid_input(), Utc::now()).unwrap();
        assert_eq!(worker.salary_basis(), SalaryBasis::Production);
    }

    #[test]
    fn deactivate_is_a_soft_delete() {
        let mut worker = Worker::create(WorkerId::new(), valid_input(), Utc::now()).unwrap();
        worker.deactivate(Utc::now());
        assert!(!worker.is_active);
        assert_eq!(worker.name, "Ravi Kumar");
    }

    #[test]
    fn role_serializes_with_display_name() {
        assert_eq!(
            serde_json::to_string(&WorkerRole::LoomOperator).unwrap(),
            "\"Loom Operator\""
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any phone made of 10+ digits (optionally prefixed by '+') is accepted.
            #[test]
            fn digit_phones_are_accepted(digits in "[0-9]{10,15}", plus in any::<bool>()) {
                let phone = if plus { format!("+{digits}") } else { digits };
                let input = NewWorker { phone, ..valid_input() };
                prop_assert!(Worker::create(WorkerId::new(), input, Utc::now()).is_ok());
            }

            /// Property: names longer than 100 characters are always rejected.
            #[test]
            fn long_names_are_rejected(name in "[A-Za-z]{101,140}") {
                let input = NewWorker { name, ..valid_input() };
                prop_assert!(Worker::create(WorkerId::new(), input, Utc::now()).is_err());
            }
        }
    }
}
