//! The generic graph shapes produced by the Entity Model (§4H) and consumed
//! by the Graph Writer (§4I).
//!
//! This module intentionally knows nothing about specific ARM types or AAD
//! classes — that dispatch lives in `stormspotter-graph`. It only fixes the
//! shape every entity eventually reduces to: a labelled node with flat
//! string-keyed properties, and a typed edge between two such nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::newtypes::RelationName;

/// The family a graph node belongs to (§3: "exactly one family label is
/// attached").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Directory-derived entity (user, group, service principal, application, role).
    AadObject,
    /// Resource-Manager-derived entity (tenant, subscription, resource group, resource).
    ArmResource,
}

impl Family {
    /// Returns the Cypher label token for this family.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AadObject => "AADObject",
            Self::ArmResource => "ARMResource",
        }
    }
}

/// A node ready for MERGE-upsert into the graph store.
///
/// `id` is the node's unique key within `family` (§3 invariant: "Node `id`
/// is unique within its family"). `class_label` is the most specific label
/// (e.g. `AADUser`, `KeyVault`); `family` is the coarser label used for the
/// uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub class_label: String,
    pub family: Family,
    pub properties: BTreeMap<String, Value>,
}

impl GraphNode {
    /// Creates a new node with no properties set.
    #[must_use]
    pub fn new(id: impl Into<String>, class_label: impl Into<String>, family: Family) -> Self {
        Self {
            id: id.into(),
            class_label: class_label.into(),
            family,
            properties: BTreeMap::new(),
        }
    }

    /// Sets a property, returning `self` for chained construction.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A directed, typed edge ready for MERGE-upsert into the graph store.
///
/// Edge key per §6: `(source_id, relation_name, target_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: String,
    pub source_family: Family,
    pub target_id: String,
    pub target_family: Family,
    pub relation: RelationName,
    pub properties: BTreeMap<String, Value>,
}

impl GraphEdge {
    /// Creates a new edge with no properties set.
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        source_family: Family,
        target_id: impl Into<String>,
        target_family: Family,
        relation: RelationName,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_family,
            target_id: target_id.into(),
            target_family,
            relation,
            properties: BTreeMap::new(),
        }
    }

    /// Sets a property, returning `self` for chained construction.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// What the Entity Model derives from one input Record: optionally a node,
/// plus the edges implied by it (§4H, §4I: "every relationship returned by
/// the node's derivation rule is enqueued").
///
/// `node` is `None` for RBAC records, which §4H defines as producing "no
/// node", only the one `(principal_id) -role-> (scope)` edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedEntity {
    pub node: Option<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl DerivedEntity {
    /// A node plus its derived edges.
    #[must_use]
    pub fn with_node(node: GraphNode, edges: Vec<GraphEdge>) -> Self {
        Self {
            node: Some(node),
            edges,
        }
    }

    /// Edges only, no node (RBAC records, §4H).
    #[must_use]
    pub fn edges_only(edges: Vec<GraphEdge>) -> Self {
        Self { node: None, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_labels_match_spec_vocabulary() {
        assert_eq!(Family::AadObject.label(), "AADObject");
        assert_eq!(Family::ArmResource.label(), "ARMResource");
    }

    #[test]
    fn node_builder_sets_properties() {
        let node = GraphNode::new("v1", "KeyVault", Family::ArmResource)
            .with_property("vaultUri", "https://v.vault.azure.net");
        assert_eq!(node.id, "v1");
        assert_eq!(
            node.properties.get("vaultUri").unwrap(),
            &Value::from("https://v.vault.azure.net")
        );
    }

    #[test]
    fn edge_builder_sets_properties() {
        let edge = GraphEdge::new(
            "oid-1",
            Family::AadObject,
            "v1",
            Family::ArmResource,
            RelationName::HasAccessPolicies,
        )
        .with_property("keys", Value::Array(vec![Value::from("get")]));
        assert_eq!(edge.relation, RelationName::HasAccessPolicies);
        assert!(edge.properties.contains_key("keys"));
    }

    #[test]
    fn edges_only_has_no_node() {
        let edge = GraphEdge::new("p1", Family::AadObject, "s1", Family::ArmResource, RelationName::Owns);
        let derived = DerivedEntity::edges_only(vec![edge]);
        assert!(derived.node.is_none());
        assert_eq!(derived.edges.len(), 1);
    }
}
