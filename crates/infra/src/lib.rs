//! Infrastructure layer: document storage and the bindings that place each
//! workshop record in its collection.

pub mod documents;
pub mod store;

pub use store::{
    Document, DocumentStore, InMemoryDocumentStore, InMemoryHealth, PostgresDocumentStore, PostgresHealth,
    StoreError, StoreHealth, StoreStatus,
};
