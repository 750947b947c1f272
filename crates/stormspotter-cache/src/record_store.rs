//! SQLite implementation of `IRecordStore` (§4B).
//!
//! One [`SqliteRecordStore`] is scoped to a single output directory for the
//! lifetime of a collection run. Each class it is asked to append to gets
//! its own `<class>.sqlite` file, opened lazily and kept open for the rest
//! of the run so repeated appends don't pay reopen cost.

use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::{Row, SqlitePool};

use stormspotter_core::domain::Record;
use stormspotter_core::ports::IRecordStore;

use crate::errors::CacheError;
use crate::pool::open_class_pool;

/// Append-only local artifact store backed by one SQLite file per class.
pub struct SqliteRecordStore {
    output_dir: PathBuf,
    pools: DashMap<String, SqlitePool>,
}

impl SqliteRecordStore {
    /// Creates a store rooted at `output_dir`, creating the directory if it
    /// does not already exist.
    ///
    /// # Errors
    /// Returns an error if `output_dir` cannot be created.
    pub fn new(output_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            pools: DashMap::new(),
        })
    }

    /// The directory this store writes class files into; used by the
    /// orchestrator to locate files for archiving (§4G, §6).
    #[must_use]
    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    async fn pool_for(&self, class: &str) -> Result<SqlitePool, CacheError> {
        if let Some(pool) = self.pools.get(class) {
            return Ok(pool.clone());
        }
        let path = self.output_dir.join(format!("{class}.sqlite"));
        let pool = open_class_pool(&path).await?;
        self.pools.insert(class.to_string(), pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl IRecordStore for SqliteRecordStore {
    async fn append(&self, class: &str, record: &Record) -> anyhow::Result<()> {
        let pool = self.pool_for(class).await?;
        let bytes = rmp_serde::to_vec(&record.payload).map_err(|e| {
            CacheError::SerializationError(format!("failed to msgpack-encode record: {e}"))
        })?;

        sqlx::query("INSERT INTO results (result) VALUES (?)")
            .bind(bytes)
            .execute(&pool)
            .await?;

        tracing::trace!(class, "appended record");
        Ok(())
    }

    async fn count(&self, class: &str) -> anyhow::Result<i64> {
        let pool = self.pool_for(class).await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results")
            .fetch_one(&pool)
            .await?;
        Ok(count)
    }

    async fn classes(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.pools.iter().map(|entry| entry.key().clone()).collect())
    }
}

/// Reads every record out of a single class's `.sqlite` file, in insertion
/// order. Used by the ingestor to replay an archived run (§6: "archive →
/// Record Store reader → Entity Model").
///
/// This is a free function rather than a trait method on `IRecordStore`
/// because reading is only ever done against a closed, already-extracted
/// archive file, never against the store a collection run is actively
/// writing to.
///
/// # Errors
/// Returns an error if `path` cannot be opened as a SQLite database or a
/// stored blob fails to decode as msgpack.
pub async fn read_class_file(path: &std::path::Path, class: &str) -> anyhow::Result<Vec<Record>> {
    let pool = open_class_pool(path).await?;
    let rows = sqlx::query("SELECT id, result FROM results ORDER BY id ASC")
        .fetch_all(&pool)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: i64 = row.get("id");
        let blob: Vec<u8> = row.get("result");
        let payload: serde_json::Value = rmp_serde::from_slice(&blob).map_err(|e| {
            CacheError::SerializationError(format!("failed to decode record {id} in {class}: {e}"))
        })?;
        records.push(Record::new(class, payload).with_sequence(id));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn append_creates_class_file_and_counts_records() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().to_path_buf()).unwrap();

        store
            .append("tenant", &Record::new("tenant", json!({"id": "t1"})))
            .await
            .unwrap();
        store
            .append("tenant", &Record::new("tenant", json!({"id": "t2"})))
            .await
            .unwrap();

        assert_eq!(store.count("tenant").await.unwrap(), 2);
        assert!(dir.path().join("tenant.sqlite").exists());
    }

    #[tokio::test]
    async fn classes_lists_every_class_appended_to() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().to_path_buf()).unwrap();

        store
            .append("tenant", &Record::new("tenant", json!({"id": "t1"})))
            .await
            .unwrap();
        store
            .append("rbac", &Record::new("rbac", json!({"id": "r1"})))
            .await
            .unwrap();

        let mut classes = store.classes().await.unwrap();
        classes.sort();
        assert_eq!(classes, vec!["rbac".to_string(), "tenant".to_string()]);
    }

    #[tokio::test]
    async fn unseen_class_starts_at_zero() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.count("subscription").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn read_class_file_round_trips_payloads_in_order() {
        let dir = tempdir().unwrap();
        let store = SqliteRecordStore::new(dir.path().to_path_buf()).unwrap();
        store
            .append("tenant", &Record::new("tenant", json!({"id": "t1"})))
            .await
            .unwrap();
        store
            .append("tenant", &Record::new("tenant", json!({"id": "t2"})))
            .await
            .unwrap();

        let records = read_class_file(&dir.path().join("tenant.sqlite"), "tenant")
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload, json!({"id": "t1"}));
        assert_eq!(records[0].sequence, Some(1));
        assert_eq!(records[1].payload, json!({"id": "t2"}));
    }
}
