//! Production domain module.
//!
//! Two record shapes live here:
//! - [`PowerloomProduction`]: one loom, one day, one worker, quantities per
//!   machine slot. Drives loom-operator salaries.
//! - [`ProductionRecord`]: a single shift's output on a named machine.

pub mod powerloom;
pub mod shift_record;

pub use powerloom::{
    MachineEntry, NewMachineEntry, NewPowerloomProduction, PowerloomFilter, PowerloomProduction,
};
pub use shift_record::{
    NewProductionRecord, ProductionFilter, ProductionRecord, ProductionRecordPatch, QualityGrade, Shift,
};
