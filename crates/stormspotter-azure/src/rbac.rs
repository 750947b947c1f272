//! The RBAC Collector (§4F).

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use stormspotter_core::domain::Record;
use stormspotter_core::ports::IRecordStore;
use stormspotter_core::usecases::TokenGate;

use crate::http::{next_link, page_values, AzureHttp};

const ROLE_ASSIGNMENTS_API_VERSION: &str = "2018-01-01-preview";
const ROLE_DEFINITIONS_API_VERSION: &str = "2018-01-01-preview";

/// Enumerates role assignments for a subscription, annotates each with its
/// referenced role definition, and persists the result to the shared
/// `Rbac` class (§4F).
///
/// The original collector this is ported from fetches role definitions
/// through a synchronous SDK call and so needs a bounded worker-thread
/// pool to avoid blocking its event loop; `AzureHttp` here is fully async
/// end to end, so no such pool is needed (see `DESIGN.md`).
pub struct RbacCollector {
    http: AzureHttp,
    store: Arc<dyn IRecordStore>,
    arm_base: String,
}

impl RbacCollector {
    #[must_use]
    pub fn new(http: AzureHttp, store: Arc<dyn IRecordStore>, arm_base: impl Into<String>) -> Self {
        Self {
            http,
            store,
            arm_base: arm_base.into(),
        }
    }

    fn url(&self, path: &str, api_version: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{}{}{sep}api-version={api_version}", self.arm_base.trim_end_matches('/'), path)
    }

    /// Runs the collector for one subscription, returning the distinct
    /// principal IDs referenced, for the AAD back-fill entry point (§4D,
    /// §4F: "in backfill+ARM-only mode, hand the distinct principal_id set
    /// to AAD back-fill").
    pub async fn run(&self, gate: &mut TokenGate, sub_id: &str) -> Vec<String> {
        let mut principal_ids = HashSet::new();
        let mut url = self.url(
            &format!("/subscriptions/{sub_id}/providers/Microsoft.Authorization/roleAssignments"),
            ROLE_ASSIGNMENTS_API_VERSION,
        );

        loop {
            let page = match self.http.get_json(gate, &url).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(sub_id, error = %err, "role assignment enumeration failed");
                    return principal_ids.into_iter().collect();
                }
            };

            for assignment in page_values(&page) {
                if let Some(principal_id) = assignment
                    .pointer("/properties/principalId")
                    .and_then(Value::as_str)
                {
                    principal_ids.insert(principal_id.to_string());
                }

                let annotated = self.annotate_with_role_definition(gate, assignment).await;
                let record = Record::new("Rbac", annotated);
                if let Err(err) = self.store.append("rbac", &record).await {
                    warn!(error = %err, "failed to store RBAC record");
                }
            }

            match next_link(&page) {
                Some(next) => url = next,
                None => break,
            }
        }

        principal_ids.into_iter().collect()
    }

    async fn annotate_with_role_definition(&self, gate: &mut TokenGate, mut assignment: Value) -> Value {
        flatten_assignment_properties(&mut assignment);

        let Some(role_definition_id) = assignment.get("roleDefinitionId").and_then(Value::as_str).map(str::to_string)
        else {
            return assignment;
        };

        let url = self.url(&role_definition_id, ROLE_DEFINITIONS_API_VERSION);
        match self.http.get_json(gate, &url).await {
            Ok(definition) => {
                if let Some(obj) = assignment.as_object_mut() {
                    obj.insert(
                        "permissions".to_string(),
                        definition.pointer("/properties/permissions").cloned().unwrap_or(Value::Null),
                    );
                    obj.insert(
                        "roleName".to_string(),
                        definition.pointer("/properties/roleName").cloned().unwrap_or(Value::Null),
                    );
                    obj.insert(
                        "roleType".to_string(),
                        definition.pointer("/properties/type").cloned().unwrap_or(Value::Null),
                    );
                    obj.insert(
                        "roleDescription".to_string(),
                        definition.pointer("/properties/description").cloned().unwrap_or(Value::Null),
                    );
                }
            }
            Err(err) => {
                warn!(role_definition_id, error = %err, "role definition fetch failed, leaving assignment unannotated");
            }
        }
        assignment
    }
}

/// ARM returns `principalId`/`scope`/`roleDefinitionId` nested under
/// `properties`; the Python SDK's `RoleAssignment.as_dict()` this is
/// ported from exposes them as direct attributes. Mirror that by copying
/// them onto the assignment's top level so `derive_rbac` (stormspotter-graph)
/// can read a flat record like every other derivation does.
fn flatten_assignment_properties(assignment: &mut Value) {
    let Some(properties) = assignment.pointer("/properties").cloned() else {
        return;
    };
    let Some(obj) = assignment.as_object_mut() else {
        return;
    };
    for key in ["principalId", "scope", "roleDefinitionId"] {
        if let Some(value) = properties.get(key) {
            obj.insert(key.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_api_version_with_correct_separator() {
        let collector = RbacCollector::new(
            AzureHttp::new(std::time::Duration::from_secs(1)).unwrap(),
            Arc::new(NoopStore),
            "https://management.azure.com",
        );
        assert_eq!(
            collector.url("/subscriptions/abc/providers/Microsoft.Authorization/roleAssignments", "2018-01-01-preview"),
            "https://management.azure.com/subscriptions/abc/providers/Microsoft.Authorization/roleAssignments?api-version=2018-01-01-preview"
        );
    }

    #[test]
    fn flatten_copies_properties_onto_top_level() {
        let mut assignment = serde_json::json!({
            "id": "/subscriptions/s1/providers/Microsoft.Authorization/roleAssignments/ra1",
            "properties": {
                "principalId": "principal-1",
                "scope": "/subscriptions/s1",
                "roleDefinitionId": "/subscriptions/s1/providers/Microsoft.Authorization/roleDefinitions/rd1",
            },
        });
        flatten_assignment_properties(&mut assignment);
        assert_eq!(assignment.get("principalId").and_then(Value::as_str), Some("principal-1"));
        assert_eq!(assignment.get("scope").and_then(Value::as_str), Some("/subscriptions/s1"));
        assert_eq!(
            assignment.get("roleDefinitionId").and_then(Value::as_str),
            Some("/subscriptions/s1/providers/Microsoft.Authorization/roleDefinitions/rd1")
        );
    }

    #[test]
    fn flatten_is_a_noop_without_properties() {
        let mut assignment = serde_json::json!({"id": "ra1"});
        flatten_assignment_properties(&mut assignment);
        assert!(assignment.get("principalId").is_none());
    }

    struct NoopStore;

    #[async_trait::async_trait]
    impl IRecordStore for NoopStore {
        async fn append(&self, _class: &str, _record: &Record) -> anyhow::Result<()> {
            Ok(())
        }
        async fn count(&self, _class: &str) -> anyhow::Result<i64> {
            Ok(0)
        }
        async fn classes(&self) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }
}
