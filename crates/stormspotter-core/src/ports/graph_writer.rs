//! The Graph Writer port (§4I).

use async_trait::async_trait;

use crate::domain::{GraphEdge, GraphNode};

/// Serialized MERGE-based upsert queue over the graph driver.
///
/// Implementations own a single FIFO queue and one graph session (§4I,
/// §5: "the graph driver session is owned exclusively by the Graph Writer
/// task"). `insert_node`/`insert_edge` enqueue; they do not block on the
/// statement actually executing, which is what lets the ingestor derive
/// and enqueue the next record's entities without waiting on the
/// network round-trip for the previous one's Cypher.
#[async_trait]
pub trait IGraphWriter: Send + Sync {
    /// Enqueues a node MERGE-upsert.
    ///
    /// # Errors
    /// Returns an error only if the queue itself cannot accept more work
    /// (e.g. the writer task has already stopped); a Cypher-level failure
    /// on an individual statement is logged and dropped per §7
    /// (`GraphSyntaxError`), not surfaced here.
    async fn insert_node(&self, node: GraphNode) -> anyhow::Result<()>;

    /// Enqueues a relationship MERGE-upsert.
    ///
    /// # Errors
    /// See `insert_node`.
    async fn insert_edge(&self, edge: GraphEdge) -> anyhow::Result<()>;

    /// Waits until the queue drains, then tears down the session.
    ///
    /// # Errors
    /// Returns an error if the underlying driver fails to close cleanly.
    async fn close(&self) -> anyhow::Result<()>;
}
