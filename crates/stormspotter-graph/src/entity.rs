//! The Entity Model & Relationship Derivation (§4H).
//!
//! Each persisted `Record` maps to zero, one, or several `DerivedEntity`
//! values: the record's own node (if it has one) plus any nodes it
//! synthesizes (a managed identity's service principal, a
//! `managedByTenants` tenant), and every edge the record's type implies.
//! Malformed records are logged and skipped rather than propagated — one
//! bad record must not stop the rest of an archive from ingesting.

use serde_json::{Map, Value};
use tracing::warn;

use stormspotter_core::domain::{DerivedEntity, Family, GraphEdge, GraphNode, Record, RelationName};
use stormspotter_core::usecases::{flatten_tags, normalize_display_name, normalize_id};

/// Derives the node(s) and edges implied by one persisted record.
pub fn derive_entities(record: &Record) -> Vec<DerivedEntity> {
    match record.class.as_str() {
        "User" => derive_user(record),
        "Group" => derive_group(record),
        "DirectoryRole" => derive_directory_role(record),
        "Application" => derive_owned_aad(record, "AADApplication"),
        "ServicePrincipal" => derive_owned_aad(record, "AADServicePrincipal"),
        "Tenant" => derive_tenant(record),
        "Subscription" => derive_subscription(record),
        "ResourceGroup" => derive_resource_group(record),
        "Resource" => derive_resource(record),
        "Rbac" => derive_rbac(record),
        "ManagementCertificate" => Vec::new(),
        other => {
            warn!(class = other, "unrecognized record class, skipping");
            Vec::new()
        }
    }
}

fn object_of(record: &Record) -> Option<&Map<String, Value>> {
    match record.payload.as_object() {
        Some(obj) => Some(obj),
        None => {
            warn!(class = %record.class, payload = %record.payload, "record payload was not a JSON object, skipping");
            None
        }
    }
}

/// Copies every top-level scalar field into the node's properties, plus
/// `tags` flattened into its alternating list form (§4H canonicalization).
/// `skip` additionally excludes fields handled elsewhere (nested objects
/// consumed for edge derivation, the id field itself).
fn copy_scalar_and_tag_properties(mut node: GraphNode, obj: &Map<String, Value>, skip: &[&str]) -> GraphNode {
    for (key, value) in obj {
        if skip.contains(&key.as_str()) || key == "tags" {
            continue;
        }
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                node = node.with_property(key.clone(), value.clone());
            }
            _ => {}
        }
    }
    if let Some(tags) = obj.get("tags") {
        let flat = flatten_tags(tags);
        if !flat.is_null() {
            node = node.with_property("tags", flat);
        }
    }
    node
}

/// Shallow-merges scalar fields out of the nested `properties` sub-object
/// (§4H: "field-extraction paths into the nested `properties` sub-object").
fn copy_properties_subobject(mut node: GraphNode, obj: &Map<String, Value>) -> GraphNode {
    if let Some(Value::Object(props)) = obj.get("properties") {
        for (key, value) in props {
            match value {
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                    node = node.with_property(key.clone(), value.clone());
                }
                _ => {}
            }
        }
    }
    node
}

fn default_resource_group_edge(id: &str) -> Option<GraphEdge> {
    let rg = id.split("/providers").next().filter(|prefix| *prefix != id)?;
    Some(GraphEdge::new(
        rg.to_string(),
        Family::ArmResource,
        id.to_string(),
        Family::ArmResource,
        RelationName::Contains,
    ))
}

fn managed_identity_entity(obj: &Map<String, Value>, owner_id: &str) -> Option<(GraphNode, GraphEdge)> {
    let identity = obj.get("identity")?.as_object()?;
    let identity_type = identity.get("type").and_then(Value::as_str).unwrap_or("None");
    if identity_type.eq_ignore_ascii_case("none") {
        return None;
    }
    let principal_id = identity
        .get("principalId")
        .or_else(|| identity.get("principal_id"))
        .and_then(Value::as_str)?;
    let spn_id = normalize_id(principal_id);
    let spn_node = GraphNode::new(spn_id.clone(), "AADServicePrincipal", Family::AadObject);
    let edge = GraphEdge::new(
        owner_id.to_string(),
        Family::ArmResource,
        spn_id,
        Family::AadObject,
        RelationName::Is,
    );
    Some((spn_node, edge))
}

fn known_arm_label(arm_type: &str) -> Option<&'static str> {
    match arm_type {
        "microsoft.keyvault/vaults" => Some("KeyVault"),
        "microsoft.storage/storageaccounts" => Some("StorageAccount"),
        "microsoft.compute/virtualmachines" => Some("VirtualMachine"),
        "microsoft.compute/disks" => Some("Disk"),
        "microsoft.network/networkinterfaces" => Some("NetworkInterface"),
        "microsoft.network/publicipaddresses" => Some("PublicIPAddress"),
        "microsoft.network/networksecuritygroups" => Some("NetworkSecurityGroup"),
        "microsoft.network/virtualnetworks" => Some("VirtualNetwork"),
        "microsoft.web/sites" => Some("WebSite"),
        "microsoft.sql/servers" => Some("SqlServer"),
        "microsoft.sql/servers/databases" => Some("SqlDatabase"),
        _ => None,
    }
}

fn pascal_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn class_label_for_arm_type(arm_type: &str) -> String {
    match known_arm_label(arm_type) {
        Some(label) => label.to_string(),
        None => {
            warn!(arm_type, "unrecognized ARM resource type, using a generic label");
            pascal_case(arm_type.rsplit('/').next().unwrap_or(arm_type))
        }
    }
}

fn key_vault_edges(obj: &Map<String, Value>, vault_id: &str) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    let Some(policies) = obj
        .get("properties")
        .and_then(|props| props.get("accessPolicies"))
        .and_then(Value::as_array)
    else {
        return edges;
    };
    for policy in policies {
        let Some(object_id) = policy.get("objectId").and_then(Value::as_str) else {
            continue;
        };
        let mut edge = GraphEdge::new(
            normalize_id(object_id),
            Family::AadObject,
            vault_id.to_string(),
            Family::ArmResource,
            RelationName::HasAccessPolicies,
        );
        if let Some(Value::Object(permissions)) = policy.get("permissions") {
            for (key, value) in permissions {
                edge = edge.with_property(key.clone(), value.clone());
            }
        }
        edges.push(edge);
    }
    edges
}

fn network_interface_edges(obj: &Map<String, Value>, nic_id: &str) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    let props = obj.get("properties");
    if let Some(vm_id) = props
        .and_then(|p| p.get("virtualMachine"))
        .and_then(|v| v.get("id"))
        .and_then(Value::as_str)
    {
        edges.push(GraphEdge::new(
            nic_id.to_string(),
            Family::ArmResource,
            normalize_id(vm_id),
            Family::ArmResource,
            RelationName::AttachedTo,
        ));
    }
    if let Some(nsg_id) = props
        .and_then(|p| p.get("networkSecurityGroup"))
        .and_then(|v| v.get("id"))
        .and_then(Value::as_str)
    {
        edges.push(GraphEdge::new(
            nic_id.to_string(),
            Family::ArmResource,
            normalize_id(nsg_id),
            Family::ArmResource,
            RelationName::AssociatedTo,
        ));
    }
    edges
}

fn public_ip_edges(obj: &Map<String, Value>, pip_id: &str) -> Vec<GraphEdge> {
    obj.get("properties")
        .and_then(|p| p.get("ipConfiguration"))
        .and_then(|v| v.get("id"))
        .and_then(Value::as_str)
        .map(|ipconfig_id| {
            vec![GraphEdge::new(
                normalize_id(ipconfig_id),
                Family::ArmResource,
                pip_id.to_string(),
                Family::ArmResource,
                RelationName::Exposes,
            )]
        })
        .unwrap_or_default()
}

fn virtual_machine_edges(obj: &Map<String, Value>, vm_id: &str) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    let props = obj.get("properties");
    if let Some(disk_id) = props
        .and_then(|p| p.get("storageProfile"))
        .and_then(|s| s.get("osDisk"))
        .and_then(|d| d.get("managedDisk"))
        .and_then(|m| m.get("id"))
        .and_then(Value::as_str)
    {
        edges.push(GraphEdge::new(
            normalize_id(disk_id),
            Family::ArmResource,
            vm_id.to_string(),
            Family::ArmResource,
            RelationName::AttachedTo,
        ));
    }
    if let Some(nics) = props
        .and_then(|p| p.get("networkProfile"))
        .and_then(|n| n.get("networkInterfaces"))
        .and_then(Value::as_array)
    {
        for nic in nics {
            if let Some(nic_id) = nic.get("id").and_then(Value::as_str) {
                edges.push(GraphEdge::new(
                    normalize_id(nic_id),
                    Family::ArmResource,
                    vm_id.to_string(),
                    Family::ArmResource,
                    RelationName::AttachedTo,
                ));
            }
        }
    }
    edges
}

fn disk_edges(obj: &Map<String, Value>, disk_id: &str) -> Vec<GraphEdge> {
    obj.get("managedBy")
        .and_then(Value::as_str)
        .map(|owner_id| {
            vec![GraphEdge::new(
                disk_id.to_string(),
                Family::ArmResource,
                normalize_id(owner_id),
                Family::ArmResource,
                RelationName::AttachedTo,
            )]
        })
        .unwrap_or_default()
}

fn derive_tenant(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let mut obj = obj.clone();
    normalize_display_name(&mut obj);
    let Some(raw_id) = obj.get("id").and_then(Value::as_str) else {
        warn!(class = %record.class, "tenant record missing id, skipping");
        return Vec::new();
    };
    let id = normalize_id(raw_id);
    let node = copy_scalar_and_tag_properties(GraphNode::new(id, "Tenant", Family::ArmResource), &obj, &["id"]);
    vec![DerivedEntity::with_node(node, Vec::new())]
}

fn derive_subscription(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let mut obj = obj.clone();
    normalize_display_name(&mut obj);
    let Some(raw_id) = obj.get("id").and_then(Value::as_str) else {
        warn!(class = %record.class, "subscription record missing id, skipping");
        return Vec::new();
    };
    let id = normalize_id(raw_id);
    let node = copy_scalar_and_tag_properties(
        GraphNode::new(id.clone(), "Subscription", Family::ArmResource),
        &obj,
        &["id", "managedByTenants"],
    );

    let mut edges = Vec::new();
    if let Some(tenant_id) = obj.get("tenantId").and_then(Value::as_str) {
        let tenant_node_id = normalize_id(&format!("/tenants/{tenant_id}"));
        edges.push(GraphEdge::new(
            tenant_node_id,
            Family::ArmResource,
            id.clone(),
            Family::ArmResource,
            RelationName::Contains,
        ));
    }

    let mut entities = Vec::new();
    if let Some(managed_by) = obj.get("managedByTenants").and_then(Value::as_array) {
        for entry in managed_by {
            let Some(managing_tenant_id) = entry.get("tenantId").and_then(Value::as_str) else {
                continue;
            };
            let managing_tenant_node_id = normalize_id(&format!("/tenants/{managing_tenant_id}"));
            let tenant_node = GraphNode::new(managing_tenant_node_id.clone(), "Tenant", Family::ArmResource);
            entities.push(DerivedEntity::with_node(tenant_node, Vec::new()));
            edges.push(GraphEdge::new(
                managing_tenant_node_id,
                Family::ArmResource,
                id.clone(),
                Family::ArmResource,
                RelationName::Manages,
            ));
        }
    }

    entities.insert(0, DerivedEntity::with_node(node, edges));
    entities
}

fn derive_resource_group(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let mut obj = obj.clone();
    normalize_display_name(&mut obj);
    let Some(raw_id) = obj.get("id").and_then(Value::as_str) else {
        warn!(class = %record.class, "resource group record missing id, skipping");
        return Vec::new();
    };
    let id = normalize_id(raw_id);
    let mut node = copy_scalar_and_tag_properties(
        GraphNode::new(id.clone(), "ResourceGroup", Family::ArmResource),
        &obj,
        &["id", "properties"],
    );
    node = copy_properties_subobject(node, &obj);

    let mut edges = Vec::new();
    if let Some(subscription) = id.split("/resourcegroups").next().filter(|prefix| *prefix != id) {
        edges.push(GraphEdge::new(
            subscription.to_string(),
            Family::ArmResource,
            id.clone(),
            Family::ArmResource,
            RelationName::Contains,
        ));
    }

    vec![DerivedEntity::with_node(node, edges)]
}

fn derive_resource(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let mut obj = obj.clone();
    normalize_display_name(&mut obj);
    let Some(raw_id) = obj.get("id").and_then(Value::as_str) else {
        warn!(class = %record.class, "resource record missing id, skipping");
        return Vec::new();
    };
    let id = normalize_id(raw_id);
    let arm_type = obj.get("type").and_then(Value::as_str).unwrap_or_default().to_lowercase();
    let class_label = class_label_for_arm_type(&arm_type);

    let mut node = copy_scalar_and_tag_properties(
        GraphNode::new(id.clone(), class_label, Family::ArmResource),
        &obj,
        &["id", "properties", "identity"],
    );
    node = copy_properties_subobject(node, &obj);

    let mut edges: Vec<GraphEdge> = default_resource_group_edge(&id).into_iter().collect();
    edges.extend(match arm_type.as_str() {
        "microsoft.keyvault/vaults" => key_vault_edges(&obj, &id),
        "microsoft.network/networkinterfaces" => network_interface_edges(&obj, &id),
        "microsoft.network/publicipaddresses" => public_ip_edges(&obj, &id),
        "microsoft.compute/virtualmachines" => virtual_machine_edges(&obj, &id),
        "microsoft.compute/disks" => disk_edges(&obj, &id),
        _ => Vec::new(),
    });

    let mut entities = Vec::new();
    if let Some((spn_node, is_edge)) = managed_identity_entity(&obj, &id) {
        entities.push(DerivedEntity::with_node(spn_node, Vec::new()));
        edges.push(is_edge);
    }

    entities.insert(0, DerivedEntity::with_node(node, edges));
    entities
}

fn base_aad_node(obj: &Map<String, Value>, class_label: &str) -> Option<(GraphNode, String)> {
    let id = normalize_id(obj.get("objectId").and_then(Value::as_str)?);
    let node = copy_scalar_and_tag_properties(
        GraphNode::new(id.clone(), class_label, Family::AadObject),
        obj,
        &["objectId", "owners", "members"],
    );
    Some((node, id))
}

fn ownership_edges(obj: &Map<String, Value>, object_id: &str) -> Vec<GraphEdge> {
    let Some(owners) = obj.get("owners").and_then(Value::as_array) else {
        return Vec::new();
    };
    owners
        .iter()
        .filter_map(Value::as_str)
        .map(|owner_id| {
            GraphEdge::new(
                normalize_id(owner_id),
                Family::AadObject,
                object_id.to_string(),
                Family::AadObject,
                RelationName::Owns,
            )
        })
        .collect()
}

fn membership_edges(obj: &Map<String, Value>, group_id: &str) -> Vec<GraphEdge> {
    let Some(members) = obj.get("members").and_then(Value::as_array) else {
        return Vec::new();
    };
    members
        .iter()
        .filter_map(Value::as_str)
        .map(|member_id| {
            GraphEdge::new(
                normalize_id(member_id),
                Family::AadObject,
                group_id.to_string(),
                Family::AadObject,
                RelationName::MemberOf,
            )
        })
        .collect()
}

fn role_member_edges(obj: &Map<String, Value>, role_id: &str) -> Vec<GraphEdge> {
    let Some(members) = obj.get("members").and_then(Value::as_array) else {
        return Vec::new();
    };
    members
        .iter()
        .filter_map(Value::as_str)
        .map(|member_id| {
            GraphEdge::new(
                normalize_id(member_id),
                Family::AadObject,
                role_id.to_string(),
                Family::AadObject,
                RelationName::HasRole,
            )
        })
        .collect()
}

fn derive_user(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let Some((node, _id)) = base_aad_node(obj, "AADUser") else {
        warn!(class = %record.class, "AAD user record missing objectId, skipping");
        return Vec::new();
    };
    vec![DerivedEntity::with_node(node, Vec::new())]
}

fn derive_group(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let Some((node, id)) = base_aad_node(obj, "AADGroup") else {
        warn!(class = %record.class, "AAD group record missing objectId, skipping");
        return Vec::new();
    };
    let mut edges = ownership_edges(obj, &id);
    edges.extend(membership_edges(obj, &id));
    vec![DerivedEntity::with_node(node, edges)]
}

fn derive_directory_role(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let Some((node, id)) = base_aad_node(obj, "AADRole") else {
        warn!(class = %record.class, "AAD directory role record missing objectId, skipping");
        return Vec::new();
    };
    let edges = role_member_edges(obj, &id);
    vec![DerivedEntity::with_node(node, edges)]
}

fn derive_owned_aad(record: &Record, class_label: &str) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let Some((node, id)) = base_aad_node(obj, class_label) else {
        warn!(class = %record.class, "AAD record missing objectId, skipping");
        return Vec::new();
    };
    let edges = ownership_edges(obj, &id);
    vec![DerivedEntity::with_node(node, edges)]
}

fn derive_rbac(record: &Record) -> Vec<DerivedEntity> {
    let Some(obj) = object_of(record) else {
        return Vec::new();
    };
    let (Some(principal_id), Some(scope)) = (
        obj.get("principalId").and_then(Value::as_str),
        obj.get("scope").and_then(Value::as_str),
    ) else {
        warn!(payload = %record.payload, "RBAC record missing principalId/scope, skipping");
        return Vec::new();
    };
    let Some(role_name) = obj.get("roleName").and_then(Value::as_str) else {
        warn!(payload = %record.payload, "RBAC record missing roleName, skipping");
        return Vec::new();
    };
    let relation = match RelationName::from_role_name(role_name) {
        Ok(relation) => relation,
        Err(err) => {
            warn!(error = %err, role_name, "RBAC role name produced no usable relation, skipping");
            return Vec::new();
        }
    };

    let mut edge = GraphEdge::new(
        normalize_id(principal_id),
        Family::AadObject,
        normalize_id(scope),
        Family::ArmResource,
        relation,
    );
    for key in ["roleType", "roleDescription"] {
        if let Some(value) = obj.get(key) {
            edge = edge.with_property(key, value.clone());
        }
    }
    if let Some(permissions) = obj.get("permissions") {
        edge = edge.with_property("permissions", permissions.clone());
    }

    vec![DerivedEntity::edges_only(vec![edge])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_class_yields_nothing() {
        let record = Record::new("NotAClass", json!({}));
        assert!(derive_entities(&record).is_empty());
    }

    #[test]
    fn management_certificate_has_no_graph_representation() {
        let record = Record::new("ManagementCertificate", json!({"thumbprint": "abc"}));
        assert!(derive_entities(&record).is_empty());
    }

    #[test]
    fn derive_user_builds_a_bare_node() {
        let record = Record::new("User", json!({"objectId": "ABC-123", "displayName": "Alice"}));
        let entities = derive_entities(&record);
        assert_eq!(entities.len(), 1);
        let node = entities[0].node.as_ref().unwrap();
        assert_eq!(node.id, "abc-123");
        assert_eq!(node.class_label, "AADUser");
        assert!(entities[0].edges.is_empty());
        assert_eq!(node.properties.get("name").unwrap(), &json!("Alice"));
    }

    #[test]
    fn derive_group_emits_owns_and_memberof_edges() {
        let record = Record::new(
            "Group",
            json!({"objectId": "G1", "displayName": "Team", "owners": ["O1"], "members": ["M1"]}),
        );
        let entities = derive_entities(&record);
        assert_eq!(entities.len(), 1);
        let edges = &entities[0].edges;
        assert!(edges.iter().any(|e| e.relation == RelationName::Owns && e.source_id == "o1"));
        assert!(edges.iter().any(|e| e.relation == RelationName::MemberOf && e.source_id == "m1"));
    }

    #[test]
    fn derive_resource_emits_default_resourcegroup_contains_edge() {
        let record = Record::new(
            "Resource",
            json!({
                "id": "/subscriptions/S1/resourceGroups/RG1/providers/Microsoft.Storage/storageAccounts/acct1",
                "type": "Microsoft.Storage/storageAccounts",
                "name": "acct1",
            }),
        );
        let entities = derive_entities(&record);
        assert_eq!(entities.len(), 1);
        let node = entities[0].node.as_ref().unwrap();
        assert_eq!(node.class_label, "StorageAccount");
        let edge = entities[0]
            .edges
            .iter()
            .find(|e| e.relation == RelationName::Contains)
            .unwrap();
        assert_eq!(edge.source_id, "/subscriptions/s1/resourcegroups/rg1");
        assert_eq!(edge.target_id, node.id);
    }

    #[test]
    fn derive_resource_synthesizes_managed_identity_node_and_edge() {
        let record = Record::new(
            "Resource",
            json!({
                "id": "/subscriptions/S1/resourceGroups/RG1/providers/Microsoft.Compute/virtualMachines/vm1",
                "type": "Microsoft.Compute/virtualMachines",
                "identity": {"type": "SystemAssigned", "principalId": "SPN-1"},
            }),
        );
        let entities = derive_entities(&record);
        assert_eq!(entities.len(), 2);
        let spn = entities[1].node.as_ref().unwrap();
        assert_eq!(spn.id, "spn-1");
        assert_eq!(spn.class_label, "AADServicePrincipal");
        assert!(entities[0].edges.iter().any(|e| e.relation == RelationName::Is && e.target_id == "spn-1"));
    }

    #[test]
    fn managed_identity_none_synthesizes_nothing() {
        let record = Record::new(
            "Resource",
            json!({
                "id": "/subscriptions/S1/resourceGroups/RG1/providers/Microsoft.Storage/storageAccounts/a",
                "type": "Microsoft.Storage/storageAccounts",
                "identity": {"type": "None"},
            }),
        );
        let entities = derive_entities(&record);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn derive_rbac_emits_a_single_edge_with_no_node() {
        let record = Record::new(
            "Rbac",
            json!({
                "principalId": "P1",
                "scope": "/subscriptions/S1",
                "roleName": "Key Vault Administrator",
                "roleType": "BuiltInRole",
                "permissions": [{"actions": ["*"]}],
            }),
        );
        let entities = derive_entities(&record);
        assert_eq!(entities.len(), 1);
        assert!(entities[0].node.is_none());
        let edge = &entities[0].edges[0];
        assert_eq!(edge.relation.as_str(), "KeyVaultAdministrator");
        assert_eq!(edge.source_id, "p1");
        assert_eq!(edge.target_id, "/subscriptions/s1");
    }

    #[test]
    fn derive_rbac_skips_when_role_name_missing() {
        let record = Record::new("Rbac", json!({"principalId": "P1", "scope": "/subscriptions/S1"}));
        assert!(derive_entities(&record).is_empty());
    }

    #[test]
    fn derive_subscription_emits_tenant_contains_and_managed_by_tenant_manages() {
        let record = Record::new(
            "Subscription",
            json!({
                "id": "/subscriptions/S1",
                "tenantId": "T1",
                "displayName": "Prod",
                "managedByTenants": [{"tenantId": "T2"}],
            }),
        );
        let entities = derive_entities(&record);
        assert_eq!(entities.len(), 2);
        let contains = entities[0]
            .edges
            .iter()
            .find(|e| e.relation == RelationName::Contains)
            .unwrap();
        assert_eq!(contains.source_id, "/tenants/t1");
        let manages = entities[0]
            .edges
            .iter()
            .find(|e| e.relation == RelationName::Manages)
            .unwrap();
        assert_eq!(manages.source_id, "/tenants/t2");
        assert_eq!(entities[1].node.as_ref().unwrap().id, "/tenants/t2");
    }
}
