//! The Graph Writer (§4I).
//!
//! A single background task owns one Bolt session and drains one FIFO
//! queue; `insert_node`/`insert_edge` only enqueue, they never wait on
//! the statement actually executing. Statements are built as literal
//! Cypher strings (not bound parameters) per §4I's `MERGE (n:{Label}
//! {id:'…'}) SET …` shape; [`crate::sanitize::cypher_literal`] is what
//! makes that embedding safe.

use neo4rs::{query, Graph};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use stormspotter_core::domain::{Family, GraphEdge, GraphNode};
use stormspotter_core::ports::IGraphWriter;

use crate::errors::IngestError;
use crate::sanitize::cypher_literal;

enum WriteStatement {
    Node(GraphNode),
    Edge(GraphEdge),
}

/// `IGraphWriter` over a `neo4rs` Bolt connection.
pub struct Neo4jGraphWriter {
    sender: Mutex<Option<mpsc::UnboundedSender<WriteStatement>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Neo4jGraphWriter {
    /// Connects to `uri` and starts the writer task.
    ///
    /// Creates a uniqueness constraint on `{FamilyLabel}.id` for every
    /// family before returning; a constraint that already exists is not
    /// an error, any other failure aborts startup (§4I, §7
    /// `AuthFailure`).
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established or a
    /// constraint fails to create for a reason other than already
    /// existing.
    pub async fn connect(uri: &str, user: &str, password: &str) -> anyhow::Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|err| IngestError::AuthFailure {
                uri: uri.to_string(),
                source: err.into(),
            })?;
        for family in [Family::AadObject, Family::ArmResource] {
            ensure_uniqueness_constraint(&graph, family)
                .await
                .map_err(|err| IngestError::AuthFailure {
                    uri: uri.to_string(),
                    source: err,
                })?;
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(drain(graph, receiver));

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }
}

async fn ensure_uniqueness_constraint(graph: &Graph, family: Family) -> anyhow::Result<()> {
    let label = family.label();
    let statement = format!("CREATE CONSTRAINT FOR (n:{label}) REQUIRE n.id IS UNIQUE");
    if let Err(err) = graph.run(query(&statement)).await {
        let message = err.to_string();
        if message.contains("already exists") || message.contains("EquivalentSchemaRuleAlreadyExists") {
            warn!(label, "uniqueness constraint already present, continuing");
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

async fn drain(graph: Graph, mut receiver: mpsc::UnboundedReceiver<WriteStatement>) {
    while let Some(statement) = receiver.recv().await {
        let cypher = match &statement {
            WriteStatement::Node(node) => node_merge_statement(node),
            WriteStatement::Edge(edge) => edge_merge_statement(edge),
        };
        if let Err(err) = graph.run(query(&cypher)).await {
            error!(error = %err, cypher, "graph statement failed, dropping it");
        }
    }
}

fn id_literal(id: &str) -> String {
    cypher_literal(&Value::String(id.to_string()))
}

fn node_merge_statement(node: &GraphNode) -> String {
    let mut set_clauses: Vec<String> = node
        .properties
        .iter()
        .map(|(key, value)| format!("n.{key}={}", cypher_literal(value)))
        .collect();
    set_clauses.push(format!("n:{}", node.family.label()));
    format!(
        "MERGE (n:{class}{{id:{id}}}) SET {sets}",
        class = node.class_label,
        id = id_literal(&node.id),
        sets = set_clauses.join(", "),
    )
}

fn edge_merge_statement(edge: &GraphEdge) -> String {
    let set_clauses: Vec<String> = edge
        .properties
        .iter()
        .map(|(key, value)| format!("r.{key}={}", cypher_literal(value)))
        .collect();
    let set_clause = if set_clauses.is_empty() {
        String::new()
    } else {
        format!(" SET {}", set_clauses.join(", "))
    };
    format!(
        "MERGE (from:{from_label}{{id:{from_id}}}) MERGE (to:{to_label}{{id:{to_id}}}) MERGE (from)-[r:{relation}]->(to){set}",
        from_label = edge.source_family.label(),
        from_id = id_literal(&edge.source_id),
        to_label = edge.target_family.label(),
        to_id = id_literal(&edge.target_id),
        relation = edge.relation.as_str(),
        set = set_clause,
    )
}

#[async_trait::async_trait]
impl IGraphWriter for Neo4jGraphWriter {
    async fn insert_node(&self, node: GraphNode) -> anyhow::Result<()> {
        let guard = self.sender.lock().await;
        match guard.as_ref() {
            Some(sender) => sender
                .send(WriteStatement::Node(node))
                .map_err(|_| anyhow::anyhow!("graph writer queue is closed")),
            None => Err(anyhow::anyhow!("graph writer queue is closed")),
        }
    }

    async fn insert_edge(&self, edge: GraphEdge) -> anyhow::Result<()> {
        let guard = self.sender.lock().await;
        match guard.as_ref() {
            Some(sender) => sender
                .send(WriteStatement::Edge(edge))
                .map_err(|_| anyhow::anyhow!("graph writer queue is closed")),
            None => Err(anyhow::anyhow!("graph writer queue is closed")),
        }
    }

    async fn close(&self) -> anyhow::Result<()> {
        {
            let mut guard = self.sender.lock().await;
            guard.take();
        }
        let mut worker_guard = self.worker.lock().await;
        if let Some(handle) = worker_guard.take() {
            handle
                .await
                .map_err(|err| anyhow::anyhow!("graph writer task panicked: {err}"))?;
        }
        Ok(())
    }
}
