//! Cross-tab rendering of a salary report: one column per (product, machine),
//! one row per day, and a footer row of per-column salaries.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use loomworks_core::ProductId;

use crate::error::ReportError;
use crate::salary::SalaryReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSpan {
    pub product_name: String,
    pub span: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportColumn {
    pub product_id: ProductId,
    pub machine: u8,
}

impl ExportColumn {
    pub fn label(&self) -> String {
        format!("Machine {}", self.machine)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRow {
    pub date: NaiveDate,
    /// Aligned with [`ExportMatrix::columns`]. `None` where nothing was produced.
    pub cells: Vec<Option<Decimal>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMatrix {
    pub worker_name: String,
    pub header: Vec<HeaderSpan>,
    pub columns: Vec<ExportColumn>,
    pub rows: Vec<MatrixRow>,
    pub salary_row: Vec<Decimal>,
    /// Whole-unit total, the figure written to the export log.
    pub total_salary: Decimal,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl ExportMatrix {
    /// Lay out `report` as a matrix. `today` stands in for the date range when
    /// the report has no rows.
    pub fn build(report: &SalaryReport, worker_name: impl Into<String>, today: NaiveDate) -> Self {
        let dates = report.dates();
        let from_date = dates.first().copied().unwrap_or(today);
        let to_date = dates.last().copied().unwrap_or(today);

        let mut header = Vec::with_capacity(report.products.len());
        let mut columns = Vec::new();
        let mut salary_row = Vec::new();
        let mut lookup: HashMap<(NaiveDate, usize), Decimal> = HashMap::new();

        for table in &report.products {
            header.push(HeaderSpan {
                product_name: table.product_name.clone(),
                span: table.machines.len(),
            });
            let first_col = columns.len();
            for (offset, footer) in table.salary_row.iter().enumerate() {
                columns.push(ExportColumn {
                    product_id: table.product_id,
                    machine: footer.index,
                });
                salary_row.push(footer.salary);
                for row in &table.rows {
                    if let Some(m) = row.machines.iter().find(|m| m.index == footer.index) {
                        lookup.insert((row.date, first_col + offset), m.quantity);
                    }
                }
            }
        }

        let rows = dates
            .into_iter()
            .map(|date| MatrixRow {
                date,
                cells: (0..columns.len())
                    .map(|col| lookup.get(&(date, col)).copied())
                    .collect(),
            })
            .collect();

        Self {
            worker_name: worker_name.into(),
            header,
            columns,
            rows,
            salary_row,
            total_salary: report.rounded_total,
            from_date,
            to_date,
        }
    }

    /// Render as CSV. Product names sit over the first column of their span.
    pub fn to_csv(&self) -> Result<String, ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record([self.worker_name.as_str()])?;

        let mut product_row = vec!["Product".to_string()];
        for span in &self.header {
            product_row.push(span.product_name.clone());
            product_row.extend(std::iter::repeat_n(String::new(), span.span.saturating_sub(1)));
        }
        writer.write_record(&product_row)?;

        let mut machine_row = vec!["Dates".to_string()];
        machine_row.extend(self.columns.iter().map(ExportColumn::label));
        writer.write_record(&machine_row)?;

        for row in &self.rows {
            let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
            record.extend(
                row.cells
                    .iter()
                    .map(|cell| cell.map_or_else(|| "-".to_string(), |q| q.normalize().to_string())),
            );
            writer.write_record(&record)?;
        }

        let mut salary = vec!["Salary".to_string()];
        salary.extend(self.salary_row.iter().map(|s| s.normalize().to_string()));
        writer.write_record(&salary)?;

        writer.write_record(["Total Salary".to_string(), self.total_salary.normalize().to_string()])?;

        let bytes = writer
            .into_inner()
            .map_err(|e| ReportError::Encoding(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ReportError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loomworks_core::{parse_date, DateRange, LoomNumber, PowerloomEntryId, WorkerId};
    use loomworks_production::{MachineEntry, PowerloomProduction};
    use loomworks_products::Product;

    use crate::salary::{compute_salary_report, SalaryPolicy};

    fn product(name: &str, rate: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            worker_salary: Decimal::new(rate, 0),
            owner_salary: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(worker: WorkerId, day: &str, machines: &[(u8, ProductId, i64)]) -> PowerloomProduction {
        let now = Utc::now();
        PowerloomProduction {
            id: PowerloomEntryId::new(),
            loom_number: LoomNumber::One,
            date: parse_date(day).unwrap(),
            worker,
            machines: machines
                .iter()
                .map(|&(index, product, qty)| MachineEntry {
                    index,
                    product,
                    quantity: Decimal::new(qty, 0),
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> ExportMatrix {
        let worker = WorkerId::new();
        let cotton = product("Cotton", 2);
        let silk = product("Silk", 10);
        let entries = vec![
            entry(worker, "2024-04-01", &[(1, cotton.id, 10), (3, cotton.id, 4)]),
            entry(worker, "2024-04-03", &[(1, cotton.id, 5), (2, silk.id, 1)]),
        ];
        let report = compute_salary_report(
            &entries,
            &[cotton, silk],
            worker,
            DateRange::unbounded(),
            SalaryPolicy::default(),
        )
        .unwrap();
        ExportMatrix::build(&report, "Ravi", day("2024-05-01"))
    }

    #[test]
    fn lays_out_products_machines_and_days() {
        let matrix = sample();

        assert_eq!(
            matrix.header,
            vec![
                HeaderSpan {
                    product_name: "Cotton".into(),
                    span: 2
                },
                HeaderSpan {
                    product_name: "Silk".into(),
                    span: 1
                },
            ]
        );
        let labels: Vec<String> = matrix.columns.iter().map(ExportColumn::label).collect();
        assert_eq!(labels, ["Machine 1", "Machine 3", "Machine 2"]);

        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(
            matrix.rows[0].cells,
            vec![Some(Decimal::new(10, 0)), Some(Decimal::new(4, 0)), None]
        );
        assert_eq!(
            matrix.rows[1].cells,
            vec![Some(Decimal::new(5, 0)), None, Some(Decimal::new(1, 0))]
        );
        assert_eq!(
            matrix.salary_row,
            vec![Decimal::new(30, 0), Decimal::new(8, 0), Decimal::new(10, 0)]
        );
        assert_eq!(matrix.total_salary, Decimal::new(48, 0));
        assert_eq!(matrix.from_date, day("2024-04-01"));
        assert_eq!(matrix.to_date, day("2024-04-03"));
    }

    #[test]
    fn empty_report_spans_today() {
        let report = compute_salary_report(&[], &[], WorkerId::new(), DateRange::unbounded(), SalaryPolicy::default()).unwrap();
        let matrix = ExportMatrix::build(&report, "Idle", day("2024-05-01"));
        assert!(matrix.rows.is_empty());
        assert_eq!(matrix.from_date, day("2024-05-01"));
        assert_eq!(matrix.to_date, day("2024-05-01"));
        assert_eq!(matrix.total_salary, Decimal::ZERO);
    }

    #[test]
    fn renders_csv() {
        let csv = sample().to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            [
                "Ravi",
                "Product,Cotton,,Silk",
                "Dates,Machine 1,Machine 3,Machine 2",
                "2024-04-01,10,4,-",
                "2024-04-03,5,-,1",
                "Salary,30,8,10",
                "Total Salary,48",
            ]
        );
    }
}
