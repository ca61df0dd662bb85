//! Collection-scoped document storage with in-memory and Postgres backends.

pub mod document_store;
pub mod postgres;

pub use document_store::{
    Document, DocumentStore, InMemoryDocumentStore, InMemoryHealth, StoreError, StoreHealth, StoreStatus,
};
pub use postgres::{PostgresDocumentStore, PostgresHealth};
