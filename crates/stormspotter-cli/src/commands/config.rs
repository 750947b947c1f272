//! Config command - View and manage Stormspotter configuration
//!
//! Provides the `stormspotter config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use stormspotter_core::config::{CloudProfileName, CollectMode, Config};

use crate::output::{get_formatter, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "collect.mode")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(format).await,
            ConfigCommand::Set { key, value } => self.execute_set(key, value, format).await,
            ConfigCommand::Validate => self.execute_validate(format).await,
        }
    }

    /// Show current configuration
    async fn execute_show(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);

        info!(config_path = %config_path.display(), "showing configuration");

        if matches!(format, OutputFormat::Json) {
            let json = serde_json::to_value(&config).context("failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config).context("failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    /// Set a configuration value using dot-notation
    async fn execute_set(&self, key: &str, value: &str, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let config_path = Config::default_path();
        let mut config = Config::load_or_default(&config_path);

        info!(key = %key, value = %value, "setting configuration value");

        match apply_config_value(&mut config, key, value) {
            Ok(()) => {
                let errors = config.validate();
                if !errors.is_empty() {
                    let error_msgs: Vec<String> = errors.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
                    if matches!(format, OutputFormat::Json) {
                        formatter.print_json(&serde_json::json!({
                            "success": false,
                            "key": key,
                            "value": value,
                            "errors": error_msgs,
                        }));
                    } else {
                        formatter.error(&format!("Invalid value for '{}': {}", key, error_msgs.join("; ")));
                    }
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    std::fs::create_dir_all(parent).context("failed to create configuration directory")?;
                }

                let yaml = serde_yaml::to_string(&config).context("failed to serialize configuration")?;
                std::fs::write(&config_path, &yaml).context("failed to write configuration file")?;

                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "success": true,
                        "key": key,
                        "value": value,
                        "config_path": config_path.display().to_string(),
                    }));
                } else {
                    formatter.success(&format!("Set {} = {}", key, value));
                    formatter.info(&format!("Saved to {}", config_path.display()));
                }
            }
            Err(e) => {
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "key": key,
                        "value": value,
                        "error": e.to_string(),
                    }));
                } else {
                    formatter.error(&format!("Failed to set '{}': {}", key, e));
                    formatter.info("");
                    formatter.info("Supported keys:");
                    formatter.info("  cloud.profile                        - PUBLIC|GERMAN|CHINA|USGOV");
                    formatter.info("  cloud.custom_config_path              - Path to a custom cloud-profile INI");
                    formatter.info("  collect.mode                          - AAD|ARM|BOTH");
                    formatter.info("  collect.backfill                      - true|false");
                    formatter.info("  collect.include_subs                  - comma-separated subscription IDs");
                    formatter.info("  collect.exclude_subs                  - comma-separated subscription IDs");
                    formatter.info("  collect.ssl_cert_path                 - Path to a PEM for HTTPS validation");
                    formatter.info("  ingest.server                         - Neo4j bolt URI");
                    formatter.info("  ingest.port                           - Neo4j bolt port");
                    formatter.info("  ingest.user                           - Neo4j username");
                    formatter.info("  ingest.export_json                    - true|false");
                    formatter.info("  logging.level                         - trace|debug|info|warn|error");
                    formatter.info("  logging.format                        - pretty|json");
                    formatter.info("  http.request_timeout_secs             - HTTP client timeout, in seconds");
                    formatter.info("  http.page_size                        - Page size requested per API call (1-999)");
                }
            }
        }

        Ok(())
    }

    /// Validate configuration file
    async fn execute_validate(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let config_path = Config::default_path();

        let config = match Config::load(&config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if !config_path.exists() {
                    if matches!(format, OutputFormat::Json) {
                        formatter.print_json(&serde_json::json!({
                            "valid": false,
                            "config_path": config_path.display().to_string(),
                            "errors": ["Configuration file not found. Using defaults."],
                        }));
                    } else {
                        formatter.info(&format!("Configuration file not found at {}", config_path.display()));
                        formatter.info("Using default configuration. Run 'stormspotter config set <key> <value>' to create one.");
                    }
                    return Ok(());
                }

                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("failed to parse configuration: {}", e)],
                    }));
                } else {
                    formatter.error(&format!("Failed to parse configuration: {}", e));
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "validating configuration");

        let errors = config.validate();

        if matches!(format, OutputFormat::Json) {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}

fn parse_cloud_profile(value: &str) -> Result<CloudProfileName> {
    match value.to_uppercase().as_str() {
        "PUBLIC" => Ok(CloudProfileName::Public),
        "GERMAN" => Ok(CloudProfileName::German),
        "CHINA" => Ok(CloudProfileName::China),
        "USGOV" => Ok(CloudProfileName::UsGov),
        other => anyhow::bail!("expected PUBLIC|GERMAN|CHINA|USGOV, got '{other}'"),
    }
}

fn parse_collect_mode(value: &str) -> Result<CollectMode> {
    match value.to_uppercase().as_str() {
        "AAD" => Ok(CollectMode::Aad),
        "ARM" => Ok(CollectMode::Arm),
        "BOTH" => Ok(CollectMode::Both),
        other => anyhow::bail!("expected AAD|ARM|BOTH, got '{other}'"),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value.parse::<bool>().context("expected true or false")
}

fn split_subs(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Applies a dot-notation key/value pair to a `Config` struct. `ingest.pass`
/// is intentionally unsupported here: `IngestConfig::pass` is never
/// serialized back out (§10.A), so a value set through this path would be
/// silently dropped on the next save.
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "cloud.profile" => config.cloud.profile = parse_cloud_profile(value)?,
        "cloud.custom_config_path" => config.cloud.custom_config_path = Some(PathBuf::from(value)),

        "collect.mode" => config.collect.mode = parse_collect_mode(value)?,
        "collect.backfill" => config.collect.backfill = parse_bool(value)?,
        "collect.include_subs" => config.collect.include_subs = split_subs(value),
        "collect.exclude_subs" => config.collect.exclude_subs = split_subs(value),
        "collect.ssl_cert_path" => config.collect.ssl_cert_path = Some(PathBuf::from(value)),

        "ingest.server" => config.ingest.server = value.to_string(),
        "ingest.port" => config.ingest.port = value.parse::<u16>().context("expected a port number")?,
        "ingest.user" => config.ingest.user = value.to_string(),
        "ingest.export_json" => config.ingest.export_json = parse_bool(value)?,

        "logging.level" => config.logging.level = value.to_string(),
        "logging.format" => config.logging.format = value.to_string(),

        "http.request_timeout_secs" => {
            config.http.request_timeout_secs = value.parse::<u64>().context("expected a positive integer")?;
        }
        "http.page_size" => {
            config.http.page_size = value.parse::<u32>().context("expected a positive integer")?;
        }

        _ => anyhow::bail!("unknown configuration key: '{}'", key),
    }

    Ok(())
}
