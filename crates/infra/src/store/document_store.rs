use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A record that can be persisted in a [`DocumentStore`].
///
/// Every document lives in one named collection and is addressed by a string
/// key. Documents may additionally declare a unique key; stores reject a
/// second document in the same collection carrying the same unique key.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn key(&self) -> String;

    fn unique_key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Primary key or unique key already taken.
    #[error("duplicate key in {collection}: {key}")]
    Duplicate { collection: &'static str, key: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    /// The backend cannot be reached (pool closed, connection refused, poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Collection-scoped document storage.
///
/// Single-document writes are atomic. There are no cross-document
/// transactions; concurrent writers to one key resolve last-write-wins.
#[async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<D>, StoreError>;

    /// All documents in insertion order.
    async fn list(&self) -> Result<Vec<D>, StoreError>;

    /// Store a new document. Fails with [`StoreError::Duplicate`] if the key or
    /// unique key is taken.
    async fn insert(&self, doc: D) -> Result<D, StoreError>;

    /// Overwrite an existing document. Returns `None` when the key is absent.
    async fn replace(&self, doc: D) -> Result<Option<D>, StoreError>;

    /// Insert or overwrite by key.
    async fn upsert(&self, doc: D) -> Result<D, StoreError>;

    /// Delete by key, returning the removed document.
    async fn remove(&self, key: &str) -> Result<Option<D>, StoreError>;

    /// Delete every document in the collection, returning how many went.
    async fn remove_all(&self) -> Result<u64, StoreError>;
}

#[async_trait]
impl<D, S> DocumentStore<D> for Arc<S>
where
    D: Document,
    S: DocumentStore<D> + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<D>, StoreError> {
        (**self).get(key).await
    }

    async fn list(&self) -> Result<Vec<D>, StoreError> {
        (**self).list().await
    }

    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        (**self).insert(doc).await
    }

    async fn replace(&self, doc: D) -> Result<Option<D>, StoreError> {
        (**self).replace(doc).await
    }

    async fn upsert(&self, doc: D) -> Result<D, StoreError> {
        (**self).upsert(doc).await
    }

    async fn remove(&self, key: &str) -> Result<Option<D>, StoreError> {
        (**self).remove(key).await
    }

    async fn remove_all(&self) -> Result<u64, StoreError> {
        (**self).remove_all().await
    }
}

/// Connectivity report for `/api/db-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub backend: &'static str,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn status(&self) -> StoreStatus;
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryDocumentStore<D> {
    inner: RwLock<Collection<D>>,
}

#[derive(Debug)]
struct Collection<D> {
    docs: HashMap<String, D>,
    /// Insertion order, so `list` matches the Postgres backend.
    order: Vec<String>,
}

impl<D> InMemoryDocumentStore<D> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collection {
                docs: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }
}

impl<D> Default for InMemoryDocumentStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

impl<D: Document> Collection<D> {
    /// Whether another document (not `key`) already holds `doc`'s unique key.
    fn unique_taken(&self, key: &str, doc: &D) -> Option<String> {
        let unique = doc.unique_key()?;
        self.docs
            .iter()
            .any(|(k, other)| k != key && other.unique_key().as_deref() == Some(unique.as_str()))
            .then_some(unique)
    }
}

#[async_trait]
impl<D: Document> DocumentStore<D> for InMemoryDocumentStore<D> {
    async fn get(&self, key: &str) -> Result<Option<D>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.docs.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<D>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.order.iter().filter_map(|k| map.docs.get(k).cloned()).collect())
    }

    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let key = doc.key();
        if map.docs.contains_key(&key) {
            return Err(StoreError::Duplicate {
                collection: D::COLLECTION,
                key,
            });
        }
        if let Some(unique) = map.unique_taken(&key, &doc) {
            return Err(StoreError::Duplicate {
                collection: D::COLLECTION,
                key: unique,
            });
        }
        map.order.push(key.clone());
        map.docs.insert(key, doc.clone());
        Ok(doc)
    }

    async fn replace(&self, doc: D) -> Result<Option<D>, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let key = doc.key();
        if !map.docs.contains_key(&key) {
            return Ok(None);
        }
        if let Some(unique) = map.unique_taken(&key, &doc) {
            return Err(StoreError::Duplicate {
                collection: D::COLLECTION,
                key: unique,
            });
        }
        map.docs.insert(key, doc.clone());
        Ok(Some(doc))
    }

    async fn upsert(&self, doc: D) -> Result<D, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let key = doc.key();
        if let Some(unique) = map.unique_taken(&key, &doc) {
            return Err(StoreError::Duplicate {
                collection: D::COLLECTION,
                key: unique,
            });
        }
        if map.docs.insert(key.clone(), doc.clone()).is_none() {
            map.order.push(key);
        }
        Ok(doc)
    }

    async fn remove(&self, key: &str) -> Result<Option<D>, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let removed = map.docs.remove(key);
        if removed.is_some() {
            map.order.retain(|k| k != key);
        }
        Ok(removed)
    }

    async fn remove_all(&self) -> Result<u64, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let count = map.docs.len() as u64;
        map.docs.clear();
        map.order.clear();
        Ok(count)
    }
}

/// Health probe for the in-memory backend; always connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryHealth;

#[async_trait]
impl StoreHealth for InMemoryHealth {
    async fn status(&self) -> StoreStatus {
        StoreStatus {
            backend: "memory",
            connected: true,
            detail: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Bolt {
        id: String,
        name: String,
    }

    impl Document for Bolt {
        const COLLECTION: &'static str = "bolts";

        fn key(&self) -> String {
            self.id.clone()
        }

        fn unique_key(&self) -> Option<String> {
            Some(self.name.clone())
        }
    }

    fn bolt(id: &str, name: &str) -> Bolt {
        Bolt {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_get_list_in_order() {
        let store = InMemoryDocumentStore::new();
        store.insert(bolt("2", "silk")).await.unwrap();
        store.insert(bolt("1", "cotton")).await.unwrap();

        assert_eq!(store.get("1").await.unwrap(), Some(bolt("1", "cotton")));
        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, ["silk", "cotton"]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_key_and_unique_key() {
        let store = InMemoryDocumentStore::new();
        store.insert(bolt("1", "cotton")).await.unwrap();

        assert!(matches!(
            store.insert(bolt("1", "silk")).await,
            Err(StoreError::Duplicate { .. })
        ));
        assert_eq!(
            store.insert(bolt("2", "cotton")).await,
            Err(StoreError::Duplicate {
                collection: "bolts",
                key: "cotton".to_string()
            })
        );
    }

    #[tokio::test]
    async fn replace_keeps_unique_key_check_and_reports_missing() {
        let store = InMemoryDocumentStore::new();
        store.insert(bolt("1", "cotton")).await.unwrap();
        store.insert(bolt("2", "silk")).await.unwrap();

        assert_eq!(store.replace(bolt("3", "linen")).await.unwrap(), None);
        assert!(store.replace(bolt("2", "cotton")).await.is_err());
        // Re-saving under its own unique key is fine.
        assert!(store.replace(bolt("1", "cotton")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn upsert_remove_and_remove_all() {
        let store: InMemoryDocumentStore<Bolt> = InMemoryDocumentStore::new();
        store.upsert(bolt("1", "cotton")).await.unwrap();
        store.upsert(bolt("1", "linen")).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![bolt("1", "linen")]);

        store.upsert(bolt("2", "silk")).await.unwrap();
        assert_eq!(store.remove("1").await.unwrap(), Some(bolt("1", "linen")));
        assert_eq!(store.remove("1").await.unwrap(), None);
        assert_eq!(store.remove_all().await.unwrap(), 1);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let store: Arc<dyn DocumentStore<Bolt>> = Arc::new(InMemoryDocumentStore::new());
        store.insert(bolt("1", "cotton")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
