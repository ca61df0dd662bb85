use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomworks_core::{parse_date, DomainError, DomainResult, Entity, ExportLogId, WorkerId, MAX_AMOUNT};

use crate::export_matrix::ExportMatrix;

/// Record of a salary export. Append-only: never updated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLog {
    pub id: ExportLogId,
    pub worker: WorkerId,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub salary: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ExportLog {
    type Id = ExportLogId;
    const KIND: &'static str = "Export log";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Raw client payload for `POST /api/export-logs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewExportLog {
    pub worker_id: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub salary: Option<Decimal>,
}

impl ExportLog {
    pub fn create(id: ExportLogId, input: NewExportLog, now: DateTime<Utc>) -> DomainResult<Self> {
        let (Some(worker), Some(from), Some(to), Some(salary)) = (
            present(input.worker_id.as_deref()),
            present(input.from_date.as_deref()),
            present(input.to_date.as_deref()),
            input.salary,
        ) else {
            return Err(DomainError::validation(
                "workerId, fromDate, toDate, salary are required",
            ));
        };

        let worker = WorkerId::from_str(worker).map_err(|_| DomainError::validation("Invalid worker id"))?;
        if salary.is_sign_negative() && !salary.is_zero() {
            return Err(DomainError::validation("Salary cannot be negative"));
        }
        if salary > MAX_AMOUNT {
            return Err(DomainError::validation("Salary is too large"));
        }

        Ok(Self {
            id,
            worker,
            from_date: parse_date(from)?,
            to_date: parse_date(to)?,
            salary,
            created_at: now,
            updated_at: now,
        })
    }

    /// Log entry for an export that was just rendered.
    pub fn for_export(id: ExportLogId, worker: WorkerId, matrix: &ExportMatrix, now: DateTime<Utc>) -> Self {
        Self {
            id,
            worker,
            from_date: matrix.from_date.and_time(NaiveTime::MIN).and_utc(),
            to_date: matrix.to_date.and_time(NaiveTime::MIN).and_utc(),
            salary: matrix.total_salary,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sort_oldest_first(logs: &mut [ExportLog]) {
        logs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewExportLog {
        NewExportLog {
            worker_id: Some(WorkerId::new().to_string()),
            from_date: Some("2024-01-01".into()),
            to_date: Some("2024-01-31".into()),
            salary: Some(Decimal::new(4500, 0)),
        }
    }

    #[test]
    fn creates_from_complete_payload() {
        let log = ExportLog::create(ExportLogId::new(), input(), Utc::now()).unwrap();
        assert_eq!(log.salary, Decimal::new(4500, 0));
        assert_eq!(log.from_date, parse_date("2024-01-01").unwrap());
    }

    #[test]
    fn every_field_is_required() {
        let missing = NewExportLog {
            salary: None,
            ..input()
        };
        assert_eq!(
            ExportLog::create(ExportLogId::new(), missing, Utc::now()).unwrap_err(),
            DomainError::validation("workerId, fromDate, toDate, salary are required")
        );
    }

    #[test]
    fn rejects_negative_salary_and_bad_ids() {
        let negative = NewExportLog {
            salary: Some(Decimal::new(-1, 0)),
            ..input()
        };
        assert!(ExportLog::create(ExportLogId::new(), negative, Utc::now()).is_err());

        let oversized = NewExportLog {
            salary: Some(MAX_AMOUNT + Decimal::ONE),
            ..input()
        };
        assert_eq!(
            ExportLog::create(ExportLogId::new(), oversized, Utc::now()).unwrap_err(),
            DomainError::validation("Salary is too large")
        );

        let bad_worker = NewExportLog {
            worker_id: Some("w1".into()),
            ..input()
        };
        assert_eq!(
            ExportLog::create(ExportLogId::new(), bad_worker, Utc::now()).unwrap_err(),
            DomainError::validation("Invalid worker id")
        );
    }
}
