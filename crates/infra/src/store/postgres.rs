//! Postgres-backed document store.
//!
//! All collections share one `documents` table:
//!
//! | column       | type        | notes                                   |
//! |--------------|-------------|-----------------------------------------|
//! | `collection` | TEXT        | part of the primary key                 |
//! | `id`         | TEXT        | part of the primary key                 |
//! | `unique_key` | TEXT NULL   | partial unique index per collection     |
//! | `body`       | JSONB       | serialized document                     |
//! | `created_at` | TIMESTAMPTZ | insertion time, drives `list` ordering  |
//! | `updated_at` | TIMESTAMPTZ |                                         |
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{instrument, Span};

use super::document_store::{Document, DocumentStore, StoreError, StoreHealth, StoreStatus};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        unique_key TEXT,
        body JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS documents_collection_unique_key
        ON documents (collection, unique_key)
        WHERE unique_key IS NOT NULL
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS documents_collection_created_at
        ON documents (collection, created_at)
    "#,
];

/// Open a connection pool and make sure the `documents` table exists.
#[instrument(skip(database_url), err)]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

/// Postgres-backed store for one document type.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; cloning shares the pool.
pub struct PostgresDocumentStore<D> {
    pool: Arc<PgPool>,
    _doc: PhantomData<fn() -> D>,
}

impl<D> Clone for PostgresDocumentStore<D> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _doc: PhantomData,
        }
    }
}

impl<D: Document> PostgresDocumentStore<D> {
    pub fn shared(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _doc: PhantomData,
        }
    }

    fn encode(doc: &D) -> Result<serde_json::Value, StoreError> {
        serde_json::to_value(doc).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(row: &PgRow) -> Result<D, StoreError> {
        let body: serde_json::Value = row
            .try_get("body")
            .map_err(|e| StoreError::Serialization(format!("failed to read body: {e}")))?;
        serde_json::from_value(body).map_err(|e| {
            StoreError::Serialization(format!("failed to decode {} document: {e}", D::COLLECTION))
        })
    }

    fn duplicate(doc: &D) -> StoreError {
        StoreError::Duplicate {
            collection: D::COLLECTION,
            key: doc.unique_key().unwrap_or_else(|| doc.key()),
        }
    }
}

#[async_trait]
impl<D: Document> DocumentStore<D> for PostgresDocumentStore<D> {
    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn get(&self, key: &str) -> Result<Option<D>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.as_ref().map(Self::decode).transpose()
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION, count = tracing::field::Empty), err)]
    async fn list(&self) -> Result<Vec<D>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(D::COLLECTION)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        Span::current().record("count", rows.len());
        rows.iter().map(Self::decode).collect()
    }

    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, key = %doc.key()), err)]
    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, unique_key, body)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(D::COLLECTION)
        .bind(doc.key())
        .bind(doc.unique_key())
        .bind(Self::encode(&doc)?)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(doc),
            Err(e) if is_unique_violation(&e) => Err(Self::duplicate(&doc)),
            Err(e) => Err(map_sqlx_error("insert", e)),
        }
    }

    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, key = %doc.key()), err)]
    async fn replace(&self, doc: D) -> Result<Option<D>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET unique_key = $3, body = $4, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(D::COLLECTION)
        .bind(doc.key())
        .bind(doc.unique_key())
        .bind(Self::encode(&doc)?)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(None),
            Ok(_) => Ok(Some(doc)),
            Err(e) if is_unique_violation(&e) => Err(Self::duplicate(&doc)),
            Err(e) => Err(map_sqlx_error("replace", e)),
        }
    }

    #[instrument(skip(self, doc), fields(collection = D::COLLECTION, key = %doc.key()), err)]
    async fn upsert(&self, doc: D) -> Result<D, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, unique_key, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (collection, id)
            DO UPDATE SET
                unique_key = EXCLUDED.unique_key,
                body = EXCLUDED.body,
                updated_at = NOW()
            "#,
        )
        .bind(D::COLLECTION)
        .bind(doc.key())
        .bind(doc.unique_key())
        .bind(Self::encode(&doc)?)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(doc),
            Err(e) if is_unique_violation(&e) => Err(Self::duplicate(&doc)),
            Err(e) => Err(map_sqlx_error("upsert", e)),
        }
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn remove(&self, key: &str) -> Result<Option<D>, StoreError> {
        let row = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2 RETURNING body")
            .bind(D::COLLECTION)
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove", e))?;
        row.as_ref().map(Self::decode).transpose()
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn remove_all(&self) -> Result<u64, StoreError> {
        let done = sqlx::query("DELETE FROM documents WHERE collection = $1")
            .bind(D::COLLECTION)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_all", e))?;
        Ok(done.rows_affected())
    }
}

/// Connectivity probe backed by the shared pool.
#[derive(Debug, Clone)]
pub struct PostgresHealth {
    pool: Arc<PgPool>,
}

impl PostgresHealth {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for PostgresHealth {
    async fn status(&self) -> StoreStatus {
        match sqlx::query("SELECT 1").execute(&*self.pool).await {
            Ok(_) => StoreStatus {
                backend: "postgres",
                connected: true,
                detail: None,
            },
            Err(e) => StoreStatus {
                backend: "postgres",
                connected: false,
                detail: Some(e.to_string()),
            },
        }
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.code().as_deref() == Some("23505") {
                StoreError::Duplicate {
                    collection: "documents",
                    key: msg,
                }
            } else {
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some("23505");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Spool {
        id: String,
        color: String,
    }

    impl Document for Spool {
        const COLLECTION: &'static str = "test_spools";

        fn key(&self) -> String {
            self.id.clone()
        }

        fn unique_key(&self) -> Option<String> {
            Some(self.color.clone())
        }
    }

    /// Runs only when `LOOMWORKS_TEST_DATABASE_URL` points at a scratch database.
    #[tokio::test]
    async fn round_trips_against_a_live_database() {
        let Ok(url) = std::env::var("LOOMWORKS_TEST_DATABASE_URL") else {
            return;
        };
        // Schema creation runs on every connect and must tolerate an existing table.
        connect(&url, 1).await.unwrap().close().await;
        let pool = Arc::new(connect(&url, 2).await.unwrap());
        let store: PostgresDocumentStore<Spool> = PostgresDocumentStore::shared(pool);
        store.remove_all().await.unwrap();

        let red = Spool {
            id: "1".into(),
            color: "red".into(),
        };
        store.insert(red.clone()).await.unwrap();
        assert_eq!(store.get("1").await.unwrap(), Some(red.clone()));

        let clash = Spool {
            id: "2".into(),
            color: "red".into(),
        };
        assert!(matches!(store.insert(clash).await, Err(StoreError::Duplicate { .. })));

        assert_eq!(store.remove_all().await.unwrap(), 1);
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(matches!(
            map_sqlx_error("get", sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("get", sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }
}
