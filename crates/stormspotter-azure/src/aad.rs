//! The AAD Enumerator (§4D).

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use stormspotter_core::domain::Record;
use stormspotter_core::ports::IRecordStore;
use stormspotter_core::usecases::{normalize_display_name, TokenGate};

use crate::http::{next_link, page_values, AzureHttp};

/// Microsoft's own first-party tenant; `Application`/`ServicePrincipal`
/// owner expansion is skipped for objects owned by it to avoid gratuitous
/// 403s (§4D).
pub const MICROSOFT_FIRST_PARTY_TENANT: &str = "f8cdef31-a31e-4b4a-93e4-5f571e91255a";

/// The five AAD object classes enumerated every run (§4D).
pub const AAD_CLASSES: [&str; 5] = ["User", "Group", "ServicePrincipal", "Application", "DirectoryRole"];

fn resource_path(class: &str) -> &'static str {
    match class {
        "User" => "users",
        "Group" => "groups",
        "ServicePrincipal" => "servicePrincipals",
        "Application" => "applications",
        "DirectoryRole" => "directoryRoles",
        other => panic!("not an AAD class: {other}"),
    }
}

/// Walks Microsoft Graph for every AAD object class and files each record
/// under its class's store (§4D).
pub struct AadEnumerator {
    http: AzureHttp,
    store: Arc<dyn IRecordStore>,
    graph_base: String,
    tenant_id: String,
    page_size: u32,
}

impl AadEnumerator {
    #[must_use]
    pub fn new(
        http: AzureHttp,
        store: Arc<dyn IRecordStore>,
        graph_base: impl Into<String>,
        tenant_id: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            http,
            store,
            graph_base: graph_base.into(),
            tenant_id: tenant_id.into(),
            page_size,
        }
    }

    fn base_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.graph_base.trim_end_matches('/'), self.tenant_id, path)
    }

    /// Runs the full enumeration: a probe request, then each class in turn.
    /// A probe failure aborts AAD enumeration with a warning; it does not
    /// propagate, since ARM enumeration runs independently (§4D).
    pub async fn run(&self, gate: &mut TokenGate) {
        let probe_url = self.base_url("users?api-version=1.6&$top=1");
        if let Err(err) = self.http.get_json(gate, &probe_url).await {
            warn!(error = %err, "AAD probe failed, aborting AAD enumeration");
            return;
        }

        for class in AAD_CLASSES {
            self.enumerate_class(gate, class).await;
        }
    }

    async fn enumerate_class(&self, gate: &mut TokenGate, class: &str) {
        let mut url = self.base_url(&format!(
            "{}?api-version=1.6&$top={}",
            resource_path(class),
            self.page_size
        ));

        loop {
            let page = match self.http.get_json(gate, &url).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(class, error = %err, "AAD class enumeration failed, stopping class");
                    return;
                }
            };

            for mut value in page_values(&page) {
                if let Err(err) = self.parse_and_store(gate, class, &mut value).await {
                    warn!(class, error = %err, "failed to parse/store AAD record, skipping");
                }
            }

            match next_link(&page) {
                Some(next) => url = next,
                None => break,
            }
        }
    }

    async fn parse_and_store(
        &self,
        gate: &mut TokenGate,
        class: &str,
        value: &mut Value,
    ) -> anyhow::Result<()> {
        let obj = value
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("AAD {class} record was not a JSON object"))?;

        match class {
            "Group" => {
                let id = obj.get("objectId").and_then(Value::as_str).map(str::to_string);
                if let Some(id) = id {
                    obj.insert("owners".into(), Value::Array(self.expand_ids(gate, &id, "owners").await));
                    obj.insert("members".into(), Value::Array(self.expand_ids(gate, &id, "members").await));
                }
            }
            "DirectoryRole" => {
                let id = obj.get("objectId").and_then(Value::as_str).map(str::to_string);
                if let Some(id) = id {
                    obj.insert("members".into(), Value::Array(self.expand_ids(gate, &id, "members").await));
                }
            }
            "Application" | "ServicePrincipal" => {
                let id = obj.get("objectId").and_then(Value::as_str).map(str::to_string);
                let owning_tenant = obj
                    .get("appOwnerTenantId")
                    .or_else(|| obj.get("publisherDomain"))
                    .and_then(Value::as_str);
                let is_first_party = owning_tenant == Some(MICROSOFT_FIRST_PARTY_TENANT);
                let owners = if is_first_party {
                    Vec::new()
                } else if let Some(id) = id {
                    self.expand_ids(gate, &id, "owners").await
                } else {
                    Vec::new()
                };
                obj.insert("owners".into(), Value::Array(owners));
            }
            "User" => {}
            other => warn!(class = other, "unexpected AAD class, storing without expansion"),
        }

        normalize_display_name(obj);
        let record = Record::new(class, value.clone());
        self.store.append(class, &record).await?;
        Ok(())
    }

    /// Expands a navigation property to a flat list of object IDs (§4D:
    /// "expand owners and members -> list of object IDs").
    async fn expand_ids(&self, gate: &mut TokenGate, object_id: &str, nav_property: &str) -> Vec<Value> {
        let url = self.base_url(&format!("{object_id}/{nav_property}?api-version=1.6"));
        match self.http.get_json(gate, &url).await {
            Ok(page) => page_values(&page)
                .into_iter()
                .filter_map(|v| v.get("objectId").or_else(|| v.get("id")).cloned())
                .collect(),
            Err(err) => {
                warn!(object_id, nav_property, error = %err, "failed to expand navigation property");
                Vec::new()
            }
        }
    }

    /// Resolves principal IDs of unknown class (from RBAC) via batched
    /// `directoryObjects/getByIds` and files each into its class's store
    /// (§4D back-fill mode, §4F).
    pub async fn backfill(&self, gate: &mut TokenGate, principal_ids: &[String]) {
        for batch in principal_ids.chunks(1000) {
            let url = self.base_url("directoryObjects/getByIds?api-version=1.6");
            let body = json!({ "objectIds": batch });

            let response = match self.http.post_json(gate, &url, &body).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, "AAD back-fill batch failed, skipping batch");
                    continue;
                }
            };

            for mut entity in page_values(&response) {
                let odata_type = entity
                    .get("@odata.type")
                    .or_else(|| entity.get("odata.type"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();

                let class = if odata_type.ends_with("user") {
                    "User"
                } else if odata_type.ends_with("group") {
                    "Group"
                } else if odata_type.ends_with("serviceprincipal") {
                    "ServicePrincipal"
                } else if odata_type.ends_with("application") {
                    "Application"
                } else if odata_type.ends_with("directoryrole") {
                    "DirectoryRole"
                } else {
                    warn!(odata_type, "back-fill entity has unrecognized class, skipping");
                    continue;
                };

                if let Err(err) = self.parse_and_store(gate, class, &mut entity).await {
                    warn!(class, error = %err, "failed to parse/store back-filled record, skipping");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_path_maps_every_class() {
        for class in AAD_CLASSES {
            let _ = resource_path(class);
        }
    }

    #[test]
    #[should_panic(expected = "not an AAD class")]
    fn resource_path_panics_on_unknown_class() {
        resource_path("NotAClass");
    }
}
