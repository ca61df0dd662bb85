//! Domain foundation shared by the workshop crates.
//!
//! Pure primitives only: no IO, no HTTP, no storage.

pub mod date;
pub mod entity;
pub mod error;
pub mod id;
pub mod loom;
pub mod validation;

pub use date::{parse_date, DateRange};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use loom::LoomNumber;
pub use id::{ExpenseId, ExportLogId, PowerloomEntryId, ProductId, ProductionRecordId, WorkerId};
pub use validation::{FieldErrors, MAX_AMOUNT};
