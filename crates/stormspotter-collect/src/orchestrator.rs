//! The Collector Orchestrator (§4G): resolves the cloud profile, builds a
//! credential provider and output directory, runs the selected
//! enumerators, and archives the result.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use stormspotter_core::ports::IRecordStore;
use tracing::info;

use stormspotter_azure::aad::AadEnumerator;
use stormspotter_azure::arm::ArmEnumerator;
use stormspotter_azure::cloud::CloudEndpoints;
use stormspotter_azure::AzureHttp;
use stormspotter_cache::SqliteRecordStore;
use stormspotter_core::config::{CollectMode, Config};
use stormspotter_core::ports::ICredentialProvider;
use stormspotter_core::usecases::TokenGate;

use crate::archive::archive_and_cleanup;

/// Per-class record counts and the final archive path, for the `collect`
/// subcommand's end-of-run summary table (§4G, §7).
#[derive(Debug, Clone)]
pub struct CollectSummary {
    pub archive_path: PathBuf,
    pub record_counts: BTreeMap<String, i64>,
}

/// Runs one collection pass: AAD, ARM, or both, per `config.collect.mode`.
pub struct CollectorOrchestrator {
    config: Config,
    credential: Arc<dyn ICredentialProvider>,
    tenant_id: String,
    endpoints: CloudEndpoints,
}

impl CollectorOrchestrator {
    /// # Errors
    /// Returns an error if the configured cloud profile or custom config
    /// file cannot be resolved.
    pub fn new(
        config: Config,
        credential: Arc<dyn ICredentialProvider>,
        tenant_id: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let endpoints = match &config.cloud.custom_config_path {
            Some(path) => CloudEndpoints::from_custom_config(path)?,
            None => CloudEndpoints::for_profile(config.cloud.profile),
        };
        Ok(Self {
            config,
            credential,
            tenant_id: tenant_id.into(),
            endpoints,
        })
    }

    /// Runs the configured enumerators and returns the resulting archive's
    /// summary.
    ///
    /// # Errors
    /// Returns an error if the output directory cannot be created, the
    /// initial token fetch for a required audience fails (§7
    /// `AuthFailure`), or the final archive cannot be written.
    pub async fn run(&self) -> anyhow::Result<CollectSummary> {
        let output_dir = self.new_output_dir()?;
        info!(output_dir = %output_dir.display(), "starting collection run");

        let store: Arc<SqliteRecordStore> = Arc::new(SqliteRecordStore::new(output_dir.clone())?);
        let http = AzureHttp::new(std::time::Duration::from_secs(
            self.config.http.request_timeout_secs,
        ))?;

        let run_aad = matches!(self.config.collect.mode, CollectMode::Aad | CollectMode::Both);
        let run_arm = matches!(self.config.collect.mode, CollectMode::Arm | CollectMode::Both);

        let aad_task = if run_aad {
            let mut gate = TokenGate::start(Arc::clone(&self.credential), self.endpoints.ms_graph_resource.clone())
                .await
                .context("failed to obtain initial Microsoft Graph token")?;
            let enumerator = AadEnumerator::new(
                http.clone(),
                Arc::clone(&store) as Arc<dyn stormspotter_core::ports::IRecordStore>,
                self.endpoints.ms_graph_resource.clone(),
                self.tenant_id.clone(),
                self.config.http.page_size,
            );
            Some(tokio::spawn(async move {
                enumerator.run(&mut gate).await;
                gate.shutdown();
            }))
        } else {
            None
        };

        let arm_task = if run_arm {
            let mut gate = TokenGate::start(Arc::clone(&self.credential), self.endpoints.arm_resource.clone())
                .await
                .context("failed to obtain initial ARM token")?;
            let enumerator = ArmEnumerator::new(
                http.clone(),
                Arc::clone(&store) as Arc<dyn stormspotter_core::ports::IRecordStore>,
                self.endpoints.arm_resource.clone(),
                self.endpoints.management_resource.clone(),
                self.config.http.page_size,
                self.config.collect.include_subs.clone(),
                self.config.collect.exclude_subs.clone(),
            );
            Some(tokio::spawn(async move {
                let principal_ids = enumerator.run(&mut gate).await;
                gate.shutdown();
                principal_ids
            }))
        } else {
            None
        };

        if let Some(task) = aad_task {
            task.await.context("AAD enumeration task panicked")?;
        }
        let backfill_principal_ids = match arm_task {
            Some(task) => task.await.context("ARM enumeration task panicked")?,
            None => Vec::new(),
        };

        // AAD was not run (ARM-only mode), so role-assignment principals
        // referenced by RBAC have no corresponding AAD object on file;
        // back-fill them individually (§4D, §4F).
        if run_arm && !run_aad && self.config.collect.backfill && !backfill_principal_ids.is_empty() {
            let mut gate = TokenGate::start(Arc::clone(&self.credential), self.endpoints.ms_graph_resource.clone())
                .await
                .context("failed to obtain initial Microsoft Graph token for back-fill")?;
            let enumerator = AadEnumerator::new(
                http.clone(),
                Arc::clone(&store) as Arc<dyn stormspotter_core::ports::IRecordStore>,
                self.endpoints.ms_graph_resource.clone(),
                self.tenant_id.clone(),
                self.config.http.page_size,
            );
            enumerator.backfill(&mut gate, &backfill_principal_ids).await;
            gate.shutdown();
        }

        let mut record_counts = BTreeMap::new();
        for class in store.classes().await? {
            let count = store.count(&class).await?;
            record_counts.insert(class, count);
        }

        let archive_path = archive_and_cleanup(output_dir).await?;
        info!(archive = %archive_path.display(), "collection run archived");

        Ok(CollectSummary {
            archive_path,
            record_counts,
        })
    }

    fn new_output_dir(&self) -> anyhow::Result<PathBuf> {
        let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let dir = PathBuf::from(format!("results_{timestamp}"));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stormspotter_core::domain::Token;

    struct FakeCredential;

    #[async_trait]
    impl ICredentialProvider for FakeCredential {
        async fn get_token(&self, _audience: &str) -> anyhow::Result<Token> {
            Ok(Token::new("fake", chrono::Utc::now() + chrono::Duration::hours(1)))
        }
    }

    #[test]
    fn new_resolves_public_cloud_endpoints_by_default() {
        let orchestrator =
            CollectorOrchestrator::new(Config::default(), Arc::new(FakeCredential), "tenant-id").unwrap();
        assert_eq!(orchestrator.endpoints.arm_resource, "https://management.azure.com");
    }
}
