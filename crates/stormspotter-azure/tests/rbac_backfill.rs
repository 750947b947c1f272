//! End-to-end regression coverage for the real `RbacCollector` -> stored
//! `Record` -> `derive_entities` path, against a mocked ARM server
//! (pattern borrowed from `lnxdrive-graph`'s wiremock integration tests).
//!
//! The unit tests in `entity.rs` exercise `derive_rbac` against a flat
//! synthetic payload and never caught that real `RbacCollector` output
//! nests `principalId`/`scope` under `properties`; this test runs the
//! actual collector against a mock role-assignments/role-definitions pair
//! and feeds its stored record straight into `derive_entities`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stormspotter_azure::rbac::RbacCollector;
use stormspotter_azure::AzureHttp;
use stormspotter_core::domain::{Family, Record, Token};
use stormspotter_core::ports::{ICredentialProvider, IRecordStore};
use stormspotter_core::usecases::{normalize_id, TokenGate};
use stormspotter_graph::entity::derive_entities;

struct FakeCredential;

#[async_trait]
impl ICredentialProvider for FakeCredential {
    async fn get_token(&self, _audience: &str) -> anyhow::Result<Token> {
        Ok(Token::new("fake-token", chrono::Utc::now() + chrono::Duration::hours(1)))
    }
}

#[derive(Default)]
struct CapturingStore {
    records: Mutex<Vec<Record>>,
}

#[async_trait]
impl IRecordStore for CapturingStore {
    async fn append(&self, _class: &str, record: &Record) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn count(&self, _class: &str) -> anyhow::Result<i64> {
        Ok(self.records.lock().unwrap().len() as i64)
    }

    async fn classes(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["rbac".to_string()])
    }
}

#[tokio::test]
async fn rbac_collector_output_derives_a_usable_edge() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-1/providers/Microsoft.Authorization/roleAssignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [{
                "id": "/subscriptions/sub-1/providers/Microsoft.Authorization/roleAssignments/ra1",
                "properties": {
                    "principalId": "11111111-1111-1111-1111-111111111111",
                    "scope": "/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.KeyVault/vaults/kv1",
                    "roleDefinitionId": "/subscriptions/sub-1/providers/Microsoft.Authorization/roleDefinitions/rd1",
                },
            }],
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-1/providers/Microsoft.Authorization/roleDefinitions/rd1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "properties": {
                "roleName": "Key Vault Administrator",
                "type": "BuiltInRole",
                "description": "Lets you manage key vaults",
                "permissions": [{"actions": ["*"], "notActions": []}],
            },
        })))
        .mount(&server)
        .await;

    let credential: Arc<dyn ICredentialProvider> = Arc::new(FakeCredential);
    let mut gate = TokenGate::start(credential, "https://management.azure.com")
        .await
        .unwrap();

    let store = Arc::new(CapturingStore::default());
    let http = AzureHttp::new(Duration::from_secs(5)).unwrap();
    let collector = RbacCollector::new(http, Arc::clone(&store) as Arc<dyn IRecordStore>, server.uri());

    let principal_ids = collector.run(&mut gate, "sub-1").await;
    gate.shutdown();

    assert_eq!(principal_ids, vec!["11111111-1111-1111-1111-111111111111".to_string()]);

    let stored = store.records.lock().unwrap();
    assert_eq!(stored.len(), 1);
    let record = stored[0].clone();
    drop(stored);

    assert_eq!(record.payload.get("principalId").and_then(|v| v.as_str()), Some("11111111-1111-1111-1111-111111111111"));

    let entities = derive_entities(&record);
    assert_eq!(entities.len(), 1);
    let edges = &entities[0].edges;
    assert_eq!(edges.len(), 1);
    let edge = &edges[0];
    assert_eq!(edge.source_id, normalize_id("11111111-1111-1111-1111-111111111111"));
    assert_eq!(edge.source_family, Family::AadObject);
    assert_eq!(
        edge.target_id,
        normalize_id("/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.KeyVault/vaults/kv1")
    );
    assert_eq!(edge.target_family, Family::ArmResource);
    assert_eq!(edge.relation.as_str(), "KeyVaultAdministrator");
}
