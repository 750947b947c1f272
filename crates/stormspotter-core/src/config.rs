//! Configuration module for Stormspotter.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, defaults, and a builder pattern for
//! programmatic use (e.g. from the CLI, which layers flag overrides on top
//! of a loaded file).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Stormspotter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub cloud: CloudConfig,
    pub collect: CollectConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
}

/// Which well-known Azure cloud to resolve endpoints against (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudProfileName {
    Public,
    German,
    China,
    UsGov,
}

impl Default for CloudProfileName {
    fn default() -> Self {
        Self::Public
    }
}

impl std::fmt::Display for CloudProfileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Public => "PUBLIC",
            Self::German => "GERMAN",
            Self::China => "CHINA",
            Self::UsGov => "USGOV",
        };
        write!(f, "{s}")
    }
}

/// Cloud endpoint resolution settings (§4G, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Built-in well-known cloud, used unless `custom_config_path` is set.
    pub profile: CloudProfileName,
    /// Path to an INI custom-config file overriding `profile` (§6).
    pub custom_config_path: Option<PathBuf>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            profile: CloudProfileName::Public,
            custom_config_path: None,
        }
    }
}

/// Which enumerators the Collector Orchestrator runs (§4G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CollectMode {
    Aad,
    Arm,
    Both,
}

impl Default for CollectMode {
    fn default() -> Self {
        Self::Both
    }
}

/// Collector defaults (§4G, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectConfig {
    pub mode: CollectMode,
    /// Back-fill AAD objects referenced by RBAC when AAD itself was not scanned (§4D, §4F).
    pub backfill: bool,
    /// Allow-list of subscription IDs, applied before `exclude_subs` (§4E step 2).
    pub include_subs: Vec<String>,
    /// Deny-list of subscription IDs, applied after `include_subs`.
    pub exclude_subs: Vec<String>,
    /// Path to a PEM used for HTTPS validation, overriding `REQUESTS_CA_BUNDLE` (§6).
    pub ssl_cert_path: Option<PathBuf>,
}

/// Ingestor defaults (§6 `ingest` CLI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    /// Never serialized back out; a config file round-trip does not leak it.
    #[serde(skip_serializing)]
    pub pass: Option<String>,
    /// Dump each record-store blob to a sibling `.json` file (§10.E supplement).
    pub export_json: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            server: "bolt://127.0.0.1".to_string(),
            port: 7687,
            user: "neo4j".to_string(),
            pass: None,
            export_json: false,
        }
    }
}

/// Logging / tracing settings (§10.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// HTTP client defaults shared by every enumerator (§5: "must be finite").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    /// Page size requested where the API accepts one (§4D: "page size 999 where accepted").
    pub page_size: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            page_size: 999,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse as
    /// valid YAML matching this shape.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/stormspotter/config.yaml` on Linux.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("stormspotter")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"ingest.port"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(path) = &self.cloud.custom_config_path {
            if !path.exists() {
                errors.push(ValidationError {
                    field: "cloud.custom_config_path".into(),
                    message: format!("file does not exist: {}", path.display()),
                });
            }
        }

        if let Some(path) = &self.collect.ssl_cert_path {
            if !path.exists() {
                errors.push(ValidationError {
                    field: "collect.ssl_cert_path".into(),
                    message: format!("file does not exist: {}", path.display()),
                });
            }
        }

        if self.ingest.port == 0 {
            errors.push(ValidationError {
                field: "ingest.port".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.ingest.server.is_empty() {
            errors.push(ValidationError {
                field: "ingest.server".into(),
                message: "must not be empty".into(),
            });
        }

        if self.http.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "http.request_timeout_secs".into(),
                message: "must be greater than 0 (§5: HTTP calls must have a finite timeout)"
                    .into(),
            });
        }
        if self.http.page_size == 0 || self.http.page_size > 999 {
            errors.push(ValidationError {
                field: "http.page_size".into(),
                message: "must be between 1 and 999".into(),
            });
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "must be one of {VALID_LOG_LEVELS:?}, got {:?}",
                    self.logging.level
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "must be one of {VALID_LOG_FORMATS:?}, got {:?}",
                    self.logging.format
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides; the CLI
/// layers its flags on top of a loaded file through this builder rather
/// than mutating `Config` fields directly.
///
/// # Example
///
/// ```rust,no_run
/// use stormspotter_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .collect_backfill(true)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration (e.g. one loaded from disk).
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- cloud ---

    #[must_use]
    pub fn cloud_profile(mut self, profile: CloudProfileName) -> Self {
        self.config.cloud.profile = profile;
        self
    }

    #[must_use]
    pub fn cloud_custom_config_path(mut self, path: PathBuf) -> Self {
        self.config.cloud.custom_config_path = Some(path);
        self
    }

    // --- collect ---

    #[must_use]
    pub fn collect_mode(mut self, mode: CollectMode) -> Self {
        self.config.collect.mode = mode;
        self
    }

    #[must_use]
    pub fn collect_backfill(mut self, backfill: bool) -> Self {
        self.config.collect.backfill = backfill;
        self
    }

    #[must_use]
    pub fn collect_include_subs(mut self, subs: Vec<String>) -> Self {
        self.config.collect.include_subs = subs;
        self
    }

    #[must_use]
    pub fn collect_exclude_subs(mut self, subs: Vec<String>) -> Self {
        self.config.collect.exclude_subs = subs;
        self
    }

    #[must_use]
    pub fn collect_ssl_cert_path(mut self, path: PathBuf) -> Self {
        self.config.collect.ssl_cert_path = Some(path);
        self
    }

    // --- ingest ---

    #[must_use]
    pub fn ingest_server(mut self, server: impl Into<String>) -> Self {
        self.config.ingest.server = server.into();
        self
    }

    #[must_use]
    pub fn ingest_port(mut self, port: u16) -> Self {
        self.config.ingest.port = port;
        self
    }

    #[must_use]
    pub fn ingest_user(mut self, user: impl Into<String>) -> Self {
        self.config.ingest.user = user.into();
        self
    }

    #[must_use]
    pub fn ingest_pass(mut self, pass: impl Into<String>) -> Self {
        self.config.ingest.pass = Some(pass.into());
        self
    }

    #[must_use]
    pub fn ingest_export_json(mut self, export_json: bool) -> Self {
        self.config.ingest.export_json = export_json;
        self
    }

    // --- logging ---

    #[must_use]
    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    #[must_use]
    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- http ---

    #[must_use]
    pub fn http_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn http_page_size(mut self, page_size: u32) -> Self {
        self.config.http.page_size = page_size;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn default_cloud_profile_is_public() {
        assert_eq!(Config::default().cloud.profile, CloudProfileName::Public);
    }

    #[test]
    fn default_collect_mode_is_both() {
        assert_eq!(Config::default().collect.mode, CollectMode::Both);
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = Config::default();
        config.ingest.port = 0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "ingest.port"));
    }

    #[test]
    fn oversized_page_size_is_rejected() {
        let mut config = Config::default();
        config.http.page_size = 1000;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "http.page_size"));
    }

    #[test]
    fn missing_custom_config_path_is_rejected() {
        let mut config = Config::default();
        config.cloud.custom_config_path = Some(PathBuf::from("/nonexistent/cloud.ini"));
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "cloud.custom_config_path"));
    }

    #[test]
    fn load_parses_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "cloud:\n  profile: GERMAN\ncollect:\n  mode: ARM\n  backfill: true\n  include_subs: []\n  exclude_subs: []\ningest:\n  server: bolt://neo4j.local\n  port: 7687\n  user: neo4j\n  export_json: false\nlogging:\n  level: debug\n  format: json\nhttp:\n  request_timeout_secs: 30\n  page_size: 500\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.cloud.profile, CloudProfileName::German);
        assert_eq!(config.collect.mode, CollectMode::Arm);
        assert!(config.collect.backfill);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.cloud.profile, CloudProfileName::Public);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ConfigBuilder::new()
            .collect_backfill(true)
            .collect_mode(CollectMode::Aad)
            .logging_level("trace")
            .build();
        assert!(config.collect.backfill);
        assert_eq!(config.collect.mode, CollectMode::Aad);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn builder_build_validated_surfaces_errors() {
        let result = ConfigBuilder::new().logging_level("nonsense").build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn ingest_pass_is_not_serialized() {
        let config = ConfigBuilder::new().ingest_pass("secret").build();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
