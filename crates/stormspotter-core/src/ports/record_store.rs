//! The Record Store port (§4B).
//!
//! One implementation instance is scoped to a single output directory for
//! the duration of a collection run; `append` is keyed by class name so a
//! single store can multiplex all of a run's per-class files
//! (`tenant`, `subscription`, `<subId>`, `rbac`, `management_certs`, and
//! the per-AAD-class files).

use async_trait::async_trait;

use crate::domain::Record;

/// Append-only local artifact store: one file per object class.
///
/// Writes for a given class are serialized (§5: "mutated by exactly one
/// appender at a time"); the trait does not expose that locking directly
/// because it is an implementation detail of how a single store instance
/// fans writes out to per-class files.
#[async_trait]
pub trait IRecordStore: Send + Sync {
    /// Appends `record` to the named class's file, creating it (and its
    /// `results(id AUTOINCREMENT, result BLOB)` table) on first use.
    ///
    /// # Errors
    /// Returns an error if the underlying file cannot be created or
    /// written to.
    async fn append(&self, class: &str, record: &Record) -> anyhow::Result<()>;

    /// Returns the number of records appended so far for `class`, for the
    /// orchestrator's end-of-run summary table (§4G, §7).
    async fn count(&self, class: &str) -> anyhow::Result<i64>;

    /// Returns every class name that has received at least one record.
    async fn classes(&self) -> anyhow::Result<Vec<String>>;
}
