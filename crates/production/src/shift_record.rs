use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{
    parse_date, DateRange, DomainError, DomainResult, Entity, FieldErrors, ProductionRecordId, WorkerId,
};

const MACHINE_NUMBER_MAX: usize = 50;
const PRODUCT_TYPE_MAX: usize = 100;
const NOTES_MAX: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    #[default]
    Morning,
    Afternoon,
    Night,
}

impl Shift {
    pub fn as_str(self) -> &'static str {
        match self {
            Shift::Morning => "Morning",
            Shift::Afternoon => "Afternoon",
            Shift::Night => "Night",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Morning" => Some(Shift::Morning),
            "Afternoon" => Some(Shift::Afternoon),
            "Night" => Some(Shift::Night),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityGrade {
    #[default]
    A,
    B,
    C,
    Rejected,
}

impl QualityGrade {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" => Some(QualityGrade::A),
            "B" => Some(QualityGrade::B),
            "C" => Some(QualityGrade::C),
            "Rejected" => Some(QualityGrade::Rejected),
            _ => None,
        }
    }
}

/// Output of one shift on one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    pub id: ProductionRecordId,
    pub date: DateTime<Utc>,
    pub worker: WorkerId,
    pub machine_number: String,
    pub quantity_produced: Decimal,
    pub product_type: Option<String>,
    pub shift: Shift,
    pub quality_grade: QualityGrade,
    pub notes: Option<String>,
    pub wastage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ProductionRecord {
    type Id = ProductionRecordId;
    const KIND: &'static str = "Production record";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProductionRecord {
    pub date: Option<String>,
    pub worker: Option<String>,
    pub machine_number: Option<String>,
    pub quantity_produced: Option<Decimal>,
    pub product_type: Option<String>,
    pub shift: Option<String>,
    pub quality_grade: Option<String>,
    pub notes: Option<String>,
    pub wastage: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionRecordPatch {
    pub date: Option<String>,
    pub worker: Option<String>,
    pub machine_number: Option<String>,
    pub quantity_produced: Option<Decimal>,
    pub product_type: Option<Option<String>>,
    pub shift: Option<String>,
    pub quality_grade: Option<String>,
    pub notes: Option<Option<String>>,
    pub wastage: Option<Decimal>,
}

impl ProductionRecord {
    pub fn create(
        id: ProductionRecordId,
        input: NewProductionRecord,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        let date = match input.date.as_deref() {
            None => now,
            Some(raw) => validate_date(&mut errors, raw, now),
        };
        let worker = match input.worker.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => validate_worker(&mut errors, raw),
            None => {
                errors.push("Worker is required");
                None
            }
        };
        let machine_number = validate_machine_number(&mut errors, input.machine_number.as_deref().unwrap_or(""));
        let quantity_produced = match input.quantity_produced {
            Some(q) => {
                errors.amount(q, "Quantity cannot be negative", "Quantity is too large");
                q
            }
            None => {
                errors.push("Quantity produced is required");
                Decimal::ZERO
            }
        };
        let product_type = errors.optional_text(
            input.product_type.as_deref(),
            PRODUCT_TYPE_MAX,
            "Product type cannot exceed 100 characters",
        );
        let shift = match input.shift.as_deref() {
            None => Shift::default(),
            Some(raw) => validate_shift(&mut errors, raw),
        };
        let quality_grade = match input.quality_grade.as_deref() {
            None => QualityGrade::default(),
            Some(raw) => validate_grade(&mut errors, raw),
        };
        let notes = errors.optional_text(input.notes.as_deref(), NOTES_MAX, "Notes cannot exceed 500 characters");
        let wastage = input.wastage.unwrap_or(Decimal::ZERO);
        errors.amount(wastage, "Wastage cannot be negative", "Wastage is too large");

        errors.into_result()?;

        Ok(Self {
            id,
            date,
            // present whenever validation passed
            worker: worker.ok_or_else(|| DomainError::validation("Worker is required"))?,
            machine_number,
            quantity_produced,
            product_type,
            shift,
            quality_grade,
            notes,
            wastage,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. On validation failure the record is left untouched.
    pub fn apply_patch(&mut self, patch: ProductionRecordPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        let mut next = self.clone();

        if let Some(raw) = patch.date {
            next.date = validate_date(&mut errors, &raw, next.date);
        }
        if let Some(raw) = patch.worker {
            if let Some(worker) = validate_worker(&mut errors, raw.trim()) {
                next.worker = worker;
            }
        }
        if let Some(raw) = patch.machine_number {
            next.machine_number = validate_machine_number(&mut errors, &raw);
        }
        if let Some(q) = patch.quantity_produced {
            errors.amount(q, "Quantity cannot be negative", "Quantity is too large");
            next.quantity_produced = q;
        }
        if let Some(product_type) = patch.product_type {
            next.product_type = errors.optional_text(
                product_type.as_deref(),
                PRODUCT_TYPE_MAX,
                "Product type cannot exceed 100 characters",
            );
        }
        if let Some(raw) = patch.shift {
            next.shift = validate_shift(&mut errors, &raw);
        }
        if let Some(raw) = patch.quality_grade {
            next.quality_grade = validate_grade(&mut errors, &raw);
        }
        if let Some(notes) = patch.notes {
            next.notes = errors.optional_text(notes.as_deref(), NOTES_MAX, "Notes cannot exceed 500 characters");
        }
        if let Some(w) = patch.wastage {
            errors.amount(w, "Wastage cannot be negative", "Wastage is too large");
            next.wastage = w;
        }

        errors.into_result()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Newest first.
    pub fn sort_newest_first(records: &mut [ProductionRecord]) {
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    }
}

fn validate_date(errors: &mut FieldErrors, raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    parse_date(raw).unwrap_or_else(|_| {
        errors.push("Invalid date format");
        fallback
    })
}

fn validate_worker(errors: &mut FieldErrors, raw: &str) -> Option<WorkerId> {
    match WorkerId::from_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push("Invalid worker id");
            None
        }
    }
}

fn validate_machine_number(errors: &mut FieldErrors, raw: &str) -> String {
    errors.required_text(
        raw,
        MACHINE_NUMBER_MAX,
        "Machine number is required",
        "Machine number cannot exceed 50 characters",
    )
}

fn validate_shift(errors: &mut FieldErrors, raw: &str) -> Shift {
    Shift::parse(raw).unwrap_or_else(|| {
        errors.push("Please select a valid shift");
        Shift::default()
    })
}

fn validate_grade(errors: &mut FieldErrors, raw: &str) -> QualityGrade {
    QualityGrade::parse(raw).unwrap_or_else(|| {
        errors.push("Please select a valid quality grade");
        QualityGrade::default()
    })
}

/// Listing filter for `GET /api/production`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionFilter {
    pub range: DateRange,
    pub worker: Option<WorkerId>,
    pub machine_number: Option<String>,
    pub shift: Option<Shift>,
}

impl ProductionFilter {
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        worker: Option<&str>,
        machine_number: Option<&str>,
        shift: Option<&str>,
    ) -> DomainResult<Self> {
        let range = DateRange::parse(start_date, end_date)?;
        let worker = non_empty(worker).map(WorkerId::from_str).transpose()?;
        let machine_number = non_empty(machine_number).map(|m| m.trim().to_string());
        let shift = non_empty(shift)
            .map(|raw| Shift::parse(raw).ok_or_else(|| DomainError::validation("Please select a valid shift")))
            .transpose()?;
        Ok(Self {
            range,
            worker,
            machine_number,
            shift,
        })
    }

    pub fn matches(&self, record: &ProductionRecord) -> bool {
        self.range.contains(record.date)
            && self.worker.is_none_or(|w| w == record.worker)
            && self.machine_number.as_deref().is_none_or(|m| m == record.machine_number)
            && self.shift.is_none_or(|s| s == record.shift)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
