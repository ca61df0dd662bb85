//! Products domain module.
//!
//! The company product catalog: each product carries the per-unit rate paid
//! to the worker who produced it (no IO, no HTTP, no storage).

pub mod product;

pub use product::{NewProduct, Product, ProductPatch};
