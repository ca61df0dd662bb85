//! Calendar helpers: lenient date parsing and inclusive day ranges.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Parse a client-supplied date.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC) and
/// bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(input: &str) -> DomainResult<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)));
    }
    Err(DomainError::validation("Invalid date format"))
}

/// Inclusive range of calendar days (UTC). Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a range from optional client strings.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> DomainResult<Self> {
        let from = from
            .filter(|s| !s.trim().is_empty())
            .map(parse_date)
            .transpose()?
            .map(|d| d.date_naive());
        let to = to
            .filter(|s| !s.trim().is_empty())
            .map(parse_date)
            .transpose()?
            .map(|d| d.date_naive());
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(DomainError::validation("startDate must not be after endDate"));
            }
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.is_none_or(|f| day >= f) && self.to.is_none_or(|t| day <= t)
    }
}
