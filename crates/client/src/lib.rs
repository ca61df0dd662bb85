//! HTTP client for the workshop API, used by front-ends and scripts.
//!
//! Responses are unwrapped from the `{success, data}` envelope into domain
//! types; failures surface as [`ClientError`].

pub mod client;
pub mod error;
pub mod poll;
pub mod types;

pub use client::{ApiClient, Health};
pub use error::ClientError;
pub use poll::poll;
pub use types::{
    ExpenseInput, ExportLogEntry, ExportLogInput, MachineInput, PowerloomEntry, PowerloomInput,
    ProductInput, ProductRef, MachineView, WorkerInput, WorkerRef,
};
