//! Collect command - Enumerate an Azure AD tenant and/or ARM subscriptions
//! into an archive (§6 `stormspotter collect {azcli|spn}`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use stormspotter_azure::auth::{AzCliCredentialProvider, SpnCredentialProvider};
use stormspotter_azure::cloud::CloudEndpoints;
use stormspotter_collect::orchestrator::{CollectSummary, CollectorOrchestrator};
use stormspotter_core::config::{CloudProfileName, CollectMode, Config, ConfigBuilder};
use stormspotter_core::ports::ICredentialProvider;

use crate::output::{get_formatter, OutputFormat};

/// Flags shared by both `collect azcli` and `collect spn`.
#[derive(Debug, Args)]
pub struct SharedCollectArgs {
    /// Azure tenant ID to enumerate
    #[arg(long = "tenantid")]
    pub tenant_id: String,
    /// Target cloud
    #[arg(long, value_enum)]
    pub cloud: Option<CloudProfileArg>,
    /// Which enumerators to run
    #[arg(long, value_enum)]
    pub mode: Option<CollectModeArg>,
    /// Back-fill AAD objects referenced by RBAC role assignments
    #[arg(long)]
    pub backfill: bool,
    /// Only enumerate these subscription IDs
    #[arg(long = "include-subs", num_args = 1..)]
    pub include_subs: Vec<String>,
    /// Skip these subscription IDs
    #[arg(long = "exclude-subs", num_args = 1..)]
    pub exclude_subs: Vec<String>,
    /// PEM file used to validate HTTPS endpoints
    #[arg(long = "ssl-cert")]
    pub ssl_cert: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum CloudProfileArg {
    Public,
    German,
    China,
    Usgov,
}

impl From<CloudProfileArg> for CloudProfileName {
    fn from(value: CloudProfileArg) -> Self {
        match value {
            CloudProfileArg::Public => CloudProfileName::Public,
            CloudProfileArg::German => CloudProfileName::German,
            CloudProfileArg::China => CloudProfileName::China,
            CloudProfileArg::Usgov => CloudProfileName::UsGov,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum CollectModeArg {
    Aad,
    Arm,
    Both,
}

impl From<CollectModeArg> for CollectMode {
    fn from(value: CollectModeArg) -> Self {
        match value {
            CollectModeArg::Aad => CollectMode::Aad,
            CollectModeArg::Arm => CollectMode::Arm,
            CollectModeArg::Both => CollectMode::Both,
        }
    }
}

/// `collect` subcommands, one per auth mode (§6).
#[derive(Debug, Subcommand)]
pub enum CollectCommand {
    /// Authenticate by piggybacking on an existing `az login` session
    AzCli {
        #[command(flatten)]
        shared: SharedCollectArgs,
    },
    /// Authenticate as a registered service principal
    Spn {
        #[command(flatten)]
        shared: SharedCollectArgs,
        /// Application (client) ID of the service principal
        #[arg(long = "clientid")]
        client_id: String,
        /// Client secret of the service principal
        #[arg(long)]
        secret: String,
    },
}

impl CollectCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: Option<PathBuf>) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let base_config = match &config_path {
            Some(path) => Config::load_or_default(path),
            None => Config::load_or_default(&Config::default_path()),
        };

        let shared = self.shared_args();
        let config = self.layer_flags(base_config, shared);

        let endpoints = match &config.cloud.custom_config_path {
            Some(path) => CloudEndpoints::from_custom_config(path)?,
            None => CloudEndpoints::for_profile(config.cloud.profile),
        };

        let credential: Arc<dyn ICredentialProvider> = match self {
            CollectCommand::AzCli { .. } => Arc::new(AzCliCredentialProvider::new()),
            CollectCommand::Spn { client_id, secret, .. } => Arc::new(SpnCredentialProvider::new(
                shared.tenant_id.clone(),
                client_id.clone(),
                secret.clone(),
                endpoints.ad_authority.clone(),
            )),
        };

        info!(tenant_id = %shared.tenant_id, mode = %config.collect.mode.mode_label(), "starting collection");

        let orchestrator = CollectorOrchestrator::new(config, credential, shared.tenant_id.clone())
            .context("failed to resolve cloud endpoints")?;

        let summary = orchestrator.run().await.context("collection run failed")?;

        Self::print_summary(&summary, format, formatter.as_ref());

        Ok(())
    }

    fn shared_args(&self) -> &SharedCollectArgs {
        match self {
            CollectCommand::AzCli { shared } => shared,
            CollectCommand::Spn { shared, .. } => shared,
        }
    }

    fn layer_flags(&self, base: Config, shared: &SharedCollectArgs) -> Config {
        let mut builder = ConfigBuilder::from_config(base);
        if let Some(cloud) = shared.cloud {
            builder = builder.cloud_profile(cloud.into());
        }
        if let Some(mode) = shared.mode {
            builder = builder.collect_mode(mode.into());
        }
        if shared.backfill {
            builder = builder.collect_backfill(true);
        }
        if !shared.include_subs.is_empty() {
            builder = builder.collect_include_subs(shared.include_subs.clone());
        }
        if !shared.exclude_subs.is_empty() {
            builder = builder.collect_exclude_subs(shared.exclude_subs.clone());
        }
        if let Some(cert) = &shared.ssl_cert {
            builder = builder.collect_ssl_cert_path(cert.clone());
        }
        builder.build()
    }

    fn print_summary(summary: &CollectSummary, format: OutputFormat, formatter: &dyn crate::output::OutputFormatter) {
        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&serde_json::json!({
                "archive_path": summary.archive_path.display().to_string(),
                "record_counts": summary.record_counts,
            }));
        } else {
            formatter.success(&format!("Collection complete: {}", summary.archive_path.display()));
            for (class, count) in &summary.record_counts {
                formatter.info(&format!("{class}: {count}"));
            }
        }
    }
}

trait CollectModeLabel {
    fn mode_label(&self) -> &'static str;
}

impl CollectModeLabel for CollectMode {
    fn mode_label(&self) -> &'static str {
        match self {
            CollectMode::Aad => "AAD",
            CollectMode::Arm => "ARM",
            CollectMode::Both => "BOTH",
        }
    }
}
