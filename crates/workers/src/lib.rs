//! Workers domain module.
//!
//! Worker records, their role within the workshop and the validation rules
//! applied when they are created or edited (no IO, no HTTP, no storage).

pub mod worker;

pub use worker::{NewWorker, SalaryBasis, Worker, WorkerPatch, WorkerRole};
