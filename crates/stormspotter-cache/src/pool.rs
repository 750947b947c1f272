//! SQLite connection management for per-class record files (§4B).
//!
//! Each class gets its own `.sqlite` file rather than a table in a shared
//! database, matching the archive layout in §6. This module only knows how
//! to open one such file; [`crate::record_store::SqliteRecordStore`] owns a
//! pool per class and opens them lazily on first write.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::errors::CacheError;

/// Opens (creating if needed) a single-file SQLite database at `path` and
/// ensures the `results` table exists.
///
/// A single connection is used per class file: record files are
/// append-only and written from one task at a time (§5), so pooling
/// concurrent connections would only add lock contention.
pub async fn open_class_pool(path: &Path) -> Result<SqlitePool, CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| {
            CacheError::ConnectionFailed(format!("failed to open {}: {}", path.display(), e))
        })?;

    create_results_table(&pool).await?;
    Ok(pool)
}

/// Opens an in-memory database for tests, with the same schema as a real
/// class file.
pub async fn in_memory_class_pool() -> Result<SqlitePool, CacheError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| CacheError::ConnectionFailed(format!("failed to open in-memory db: {e}")))?;

    create_results_table(&pool).await?;
    Ok(pool)
}

async fn create_results_table(pool: &SqlitePool) -> Result<(), CacheError> {
    sqlx::raw_sql("CREATE TABLE IF NOT EXISTS results (id INTEGER PRIMARY KEY AUTOINCREMENT, result BLOB)")
        .execute(pool)
        .await
        .map_err(|e| CacheError::MigrationFailed(format!("failed to create results table: {e}")))?;
    Ok(())
}
