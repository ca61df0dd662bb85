//! Derived views over workshop records: loom-operator salaries, salary
//! exports, weekly profit and summary statistics.
//!
//! Everything here is a pure function of already-loaded records. Callers
//! fetch from the store, then hand slices to these functions.

pub mod error;
pub mod export_log;
pub mod export_matrix;
pub mod revenue;
pub mod salary;
pub mod stats;
pub mod weekly_profit;

pub use error::ReportError;
pub use export_log::{ExportLog, NewExportLog};
pub use export_matrix::{ExportColumn, ExportMatrix, HeaderSpan, MatrixRow};
pub use revenue::{RevenueSetting, TOTAL_REVENUE_KEY};
pub use salary::{
    compute_salary_report, InactiveProductRate, MachineQuantity, MachineSalary, ProductSalaryTable,
    SalaryPolicy, SalaryReport, SalaryRow,
};
pub use stats::{
    expense_stats, production_stats, ExpenseStats, ExpenseTotals, ExpenseTypeStat, OverallProductionStats,
    ProductionStats, ShiftStat, WorkerStat,
};
pub use weekly_profit::{weekly_profit, FinancialSummary, WeeklyProfitPoint};
