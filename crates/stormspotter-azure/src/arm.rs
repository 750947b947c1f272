//! The ARM Enumerator (§4E).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use stormspotter_core::domain::{ApiVersion, Record};
use stormspotter_core::ports::IRecordStore;
use stormspotter_core::usecases::{negotiate_api_version, parse_suggested_versions, TokenGate};

use crate::errors::CollectError;
use crate::http::{next_link, page_values, AzureHttp};
use crate::rbac::RbacCollector;

const TENANTS_API_VERSION: &str = "2020-01-01";
const SUBSCRIPTIONS_API_VERSION: &str = "2020-01-01";
const PROVIDERS_API_VERSION: &str = "2019-05-01";
const RESOURCE_GROUPS_API_VERSION: &str = "2020-06-01";
const RESOURCES_API_VERSION: &str = "2020-06-01";
const MANAGEMENT_CERTS_API_VERSION_HEADER: (&str, &str) = ("x-ms-version", "2012-03-01");

/// Walks ARM for tenants, subscriptions, resource groups, resources, RBAC
/// assignments, and (on clouds that define it) classic management
/// certificates (§4E).
pub struct ArmEnumerator {
    http: AzureHttp,
    store: Arc<dyn IRecordStore>,
    arm_base: String,
    management_base: Option<String>,
    page_size: u32,
    include_subs: Vec<String>,
    exclude_subs: Vec<String>,
}

impl ArmEnumerator {
    #[must_use]
    pub fn new(
        http: AzureHttp,
        store: Arc<dyn IRecordStore>,
        arm_base: impl Into<String>,
        management_base: Option<String>,
        page_size: u32,
        include_subs: Vec<String>,
        exclude_subs: Vec<String>,
    ) -> Self {
        Self {
            http,
            store,
            arm_base: arm_base.into(),
            management_base,
            page_size,
            include_subs,
            exclude_subs,
        }
    }

    fn url(&self, path: &str, api_version: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{}{}{sep}api-version={api_version}", self.arm_base.trim_end_matches('/'), path)
    }

    /// Enumerates tenants, then every surviving subscription (§4E).
    ///
    /// Returns the deduplicated set of RBAC principal IDs collected across
    /// every subscription, for the orchestrator's AAD back-fill entry point
    /// (§4F: "in backfill+ARM-only mode, hand the distinct principal_id set
    /// to AAD back-fill").
    pub async fn run(&self, gate: &mut TokenGate) -> Vec<String> {
        self.enumerate_tenants(gate).await;

        let subscriptions = self.enumerate_subscriptions(gate).await;
        let surviving: Vec<String> = subscriptions
            .into_iter()
            .filter(|id| self.subscription_survives(id))
            .collect();

        let mut tasks = Vec::with_capacity(surviving.len());
        for sub_id in surviving {
            let mut sub_gate = gate.clone();
            let arm = ArmSubscriptionWorker {
                http: self.http.clone(),
                store: Arc::clone(&self.store),
                arm_base: self.arm_base.clone(),
                management_base: self.management_base.clone(),
                page_size: self.page_size,
                sub_id,
            };
            tasks.push(tokio::spawn(async move { arm.run(&mut sub_gate).await }));
        }

        let mut principal_ids: std::collections::HashSet<String> = std::collections::HashSet::new();
        for task in tasks {
            match task.await {
                Ok(ids) => principal_ids.extend(ids),
                Err(err) => warn!(error = %err, "subscription enumeration task panicked"),
            }
        }
        principal_ids.into_iter().collect()
    }

    fn subscription_survives(&self, sub_id: &str) -> bool {
        if self.exclude_subs.iter().any(|s| s == sub_id) {
            return false;
        }
        if self.include_subs.is_empty() {
            return true;
        }
        self.include_subs.iter().any(|s| s == sub_id)
    }

    async fn enumerate_tenants(&self, gate: &mut TokenGate) {
        let url = self.url("/tenants", TENANTS_API_VERSION);
        match self.http.get_json(gate, &url).await {
            Ok(page) => {
                for tenant in page_values(&page) {
                    let record = Record::new("Tenant", tenant);
                    if let Err(err) = self.store.append("tenant", &record).await {
                        warn!(error = %err, "failed to store tenant record");
                    }
                }
            }
            Err(err) => warn!(error = %err, "tenant enumeration failed"),
        }
    }

    async fn enumerate_subscriptions(&self, gate: &mut TokenGate) -> Vec<String> {
        let mut ids = Vec::new();
        let mut url = self.url("/subscriptions", SUBSCRIPTIONS_API_VERSION);

        loop {
            let page = match self.http.get_json(gate, &url).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(error = %err, "subscription enumeration failed");
                    break;
                }
            };

            for sub in page_values(&page) {
                if let Some(id) = sub.get("subscriptionId").and_then(Value::as_str) {
                    ids.push(id.to_string());
                }
                let record = Record::new("Subscription", sub);
                if let Err(err) = self.store.append("subscription", &record).await {
                    warn!(error = %err, "failed to store subscription record");
                }
            }

            match next_link(&page) {
                Some(next) => url = next,
                None => break,
            }
        }
        ids
    }
}

struct ArmSubscriptionWorker {
    http: AzureHttp,
    store: Arc<dyn IRecordStore>,
    arm_base: String,
    management_base: Option<String>,
    page_size: u32,
    sub_id: String,
}

impl ArmSubscriptionWorker {
    fn url(&self, path: &str, api_version: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{}{}{sep}api-version={api_version}", self.arm_base.trim_end_matches('/'), path)
    }

    async fn run(&self, gate: &mut TokenGate) -> Vec<String> {
        let api_versions = self.provider_api_versions(gate).await;
        self.enumerate_resource_groups(gate).await;
        self.enumerate_resources(gate, &api_versions).await;

        let rbac = RbacCollector::new(self.http.clone(), Arc::clone(&self.store), self.arm_base.clone());
        let principal_ids = rbac.run(gate, &self.sub_id).await;

        self.enumerate_management_certs(gate).await;

        principal_ids
    }

    /// Builds a type -> preferred api-version map from the provider
    /// inventory: the provider's `defaultApiVersion` if set, else the
    /// first listed version (§4E.a).
    async fn provider_api_versions(&self, gate: &mut TokenGate) -> HashMap<String, String> {
        let mut map = HashMap::new();
        let url = self.url(&format!("/subscriptions/{}/providers", self.sub_id), PROVIDERS_API_VERSION);

        let page = match self.http.get_json(gate, &url).await {
            Ok(page) => page,
            Err(err) => {
                warn!(sub_id = %self.sub_id, error = %err, "provider inventory failed");
                return map;
            }
        };

        for provider in page_values(&page) {
            let Some(namespace) = provider.get("namespace").and_then(Value::as_str) else {
                continue;
            };
            for resource_type in provider
                .get("resourceTypes")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
            {
                let Some(type_name) = resource_type.get("resourceType").and_then(Value::as_str) else {
                    continue;
                };
                let api_version = resource_type
                    .get("defaultApiVersion")
                    .and_then(Value::as_str)
                    .or_else(|| {
                        resource_type
                            .get("apiVersions")
                            .and_then(Value::as_array)
                            .and_then(|v| v.first())
                            .and_then(Value::as_str)
                    });
                if let Some(api_version) = api_version {
                    map.insert(format!("{namespace}/{type_name}").to_lowercase(), api_version.to_string());
                }
            }
        }
        map
    }

    async fn enumerate_resource_groups(&self, gate: &mut TokenGate) {
        let mut url = self.url(
            &format!("/subscriptions/{}/resourcegroups?$top={}", self.sub_id, self.page_size),
            RESOURCE_GROUPS_API_VERSION,
        );

        loop {
            let page = match self.http.get_json(gate, &url).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(sub_id = %self.sub_id, error = %err, "resource group enumeration failed");
                    return;
                }
            };

            for rg in page_values(&page) {
                let record = Record::new("ResourceGroup", rg);
                if let Err(err) = self.store.append(&self.sub_id, &record).await {
                    warn!(error = %err, "failed to store resource group record");
                }
            }

            match next_link(&page) {
                Some(next) => url = next,
                None => break,
            }
        }
    }

    async fn enumerate_resources(&self, gate: &mut TokenGate, api_versions: &HashMap<String, String>) {
        let mut url = self.url(
            &format!("/subscriptions/{}/resources?$top={}", self.sub_id, self.page_size),
            RESOURCES_API_VERSION,
        );

        loop {
            let page = match self.http.get_json(gate, &url).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(sub_id = %self.sub_id, error = %err, "resource enumeration failed");
                    return;
                }
            };

            for summary in page_values(&page) {
                let Some(resource_id) = summary.get("id").and_then(Value::as_str).map(str::to_string) else {
                    continue;
                };
                let resource_type = summary
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                let preferred = api_versions.get(&resource_type).cloned();

                match self.fetch_resource_with_negotiation(gate, &resource_id, preferred).await {
                    Ok(detail) => {
                        let record = Record::new("Resource", detail);
                        if let Err(err) = self.store.append(&self.sub_id, &record).await {
                            warn!(error = %err, "failed to store resource record");
                        }
                    }
                    Err(err) => warn!(resource_id, error = %err, "resource detail fetch exhausted retries"),
                }
            }

            match next_link(&page) {
                Some(next) => url = next,
                None => break,
            }
        }
    }

    /// Fetches a resource's detail, retrying with server-suggested api
    /// versions when the initial one is rejected (§4E, §7
    /// `ApiVersionUnsupported`).
    async fn fetch_resource_with_negotiation(
        &self,
        gate: &mut TokenGate,
        resource_id: &str,
        preferred: Option<String>,
    ) -> Result<Value, CollectError> {
        let mut tried = Vec::new();
        let mut current = preferred.unwrap_or_else(|| RESOURCES_API_VERSION.to_string());

        loop {
            let version = ApiVersion::new(&current).unwrap_or_else(|_| {
                ApiVersion::new(RESOURCES_API_VERSION).expect("fallback api version is valid")
            });
            let url = self.url(resource_id, version.as_str());

            match self.http.get_json(gate, &url).await {
                Ok(detail) => return Ok(detail),
                Err(CollectError::TransportError(message)) => {
                    tried.push(version.clone());
                    let suggested = parse_suggested_versions(&message);
                    match negotiate_api_version(&tried, &suggested) {
                        Some(next) => current = next.as_str().to_string(),
                        None => {
                            return Err(CollectError::ApiVersionExhausted {
                                resource_id: resource_id.to_string(),
                            })
                        }
                    }
                }
                Err(other) => return Err(other),
            }
        }
    }

    async fn enumerate_management_certs(&self, gate: &mut TokenGate) {
        let Some(management_base) = &self.management_base else {
            return;
        };
        let url = format!("{}/{}/certificates", management_base.trim_end_matches('/'), self.sub_id);

        let body = match self
            .http
            .get_text(gate, &url, Some(MANAGEMENT_CERTS_API_VERSION_HEADER))
            .await
        {
            Ok(body) => body,
            Err(err) => {
                warn!(sub_id = %self.sub_id, error = %err, "management certificate fetch failed");
                return;
            }
        };

        if body.contains("ForbiddenError") {
            return;
        }

        for cert in crate::certs::parse_management_certificates(&body) {
            let record = Record::new(
                "ManagementCertificate",
                serde_json::json!({
                    "subscriptionId": self.sub_id,
                    "thumbprint": cert.thumbprint,
                    "created": cert.created,
                }),
            );
            if let Err(err) = self.store.append("management_certs", &record).await {
                warn!(error = %err, "failed to store management certificate record");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_include_list_admits_every_subscription() {
        let enumerator = ArmEnumerator::new(
            AzureHttp::new(std::time::Duration::from_secs(1)).unwrap(),
            Arc::new(NoopStore),
            "https://management.azure.com",
            None,
            999,
            Vec::new(),
            vec!["excluded".to_string()],
        );
        assert!(enumerator.subscription_survives("any-sub"));
        assert!(!enumerator.subscription_survives("excluded"));
    }

    #[test]
    fn non_empty_include_list_is_an_allowlist() {
        let enumerator = ArmEnumerator::new(
            AzureHttp::new(std::time::Duration::from_secs(1)).unwrap(),
            Arc::new(NoopStore),
            "https://management.azure.com",
            None,
            999,
            vec!["allowed".to_string()],
            Vec::new(),
        );
        assert!(enumerator.subscription_survives("allowed"));
        assert!(!enumerator.subscription_survives("not-allowed"));
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
