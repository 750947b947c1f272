//! Ingest command - Replay a collection archive into the property graph
//! (§6 `stormspotter ingest`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stormspotter_core::config::Config;
use stormspotter_core::ports::IGraphWriter;
use stormspotter_graph::{ingest_archive, IngestSummary, Neo4jGraphWriter};

use crate::output::{get_formatter, OutputFormat};

/// Arguments for `stormspotter ingest`.
#[derive(Debug, Args)]
pub struct IngestCommand {
    /// Path to a collection archive (`.tar.xz`)
    #[arg(short, long = "file")]
    pub file: PathBuf,
    /// Neo4j bolt URI
    #[arg(long)]
    pub server: Option<String>,
    /// Neo4j bolt port
    #[arg(long)]
    pub port: Option<u16>,
    /// Neo4j username
    #[arg(long)]
    pub user: Option<String>,
    /// Neo4j password
    #[arg(long)]
    pub pass: Option<String>,
    /// Dump each ingested record to a sibling JSON file under this directory
    #[arg(long = "export-json")]
    pub export_json_dir: Option<PathBuf>,
}

impl IngestCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: Option<PathBuf>) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let config = match &config_path {
            Some(path) => Config::load_or_default(path),
            None => Config::load_or_default(&Config::default_path()),
        };

        let server = self.server.clone().unwrap_or(config.ingest.server);
        let port = self.port.unwrap_or(config.ingest.port);
        let user = self.user.clone().unwrap_or(config.ingest.user);
        let pass = self
            .pass
            .clone()
            .or(config.ingest.pass)
            .context("a Neo4j password is required: pass --pass or set it via `stormspotter config set`")?;

        let uri = bolt_uri(&server, port);
        info!(uri = %uri, archive = %self.file.display(), "starting ingest");

        let writer: Arc<dyn IGraphWriter> = Arc::new(
            Neo4jGraphWriter::connect(&uri, &user, &pass)
                .await
                .context("failed to connect to the graph database")?,
        );

        let export_json_dir = self.export_json_dir.clone().or_else(|| {
            if config.ingest.export_json {
                Some(PathBuf::from("ingest_export"))
            } else {
                None
            }
        });
        if let Some(dir) = &export_json_dir {
            std::fs::create_dir_all(dir).context("failed to create the export-json directory")?;
        }

        let summary = ingest_archive(&self.file, writer, export_json_dir.as_deref())
            .await
            .context("ingest failed")?;

        Self::print_summary(&summary, format, formatter.as_ref());

        Ok(())
    }

    fn print_summary(summary: &IngestSummary, format: OutputFormat, formatter: &dyn crate::output::OutputFormatter) {
        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&serde_json::json!({
                "record_counts": summary.record_counts,
            }));
        } else {
            formatter.success("Ingest complete");
            for (class, count) in &summary.record_counts {
                formatter.info(&format!("{class}: {count}"));
            }
        }
    }
}

/// Builds a bolt URI from a host/scheme string and a port, replacing
/// whatever port the server string itself carries.
fn bolt_uri(server: &str, port: u16) -> String {
    if let Some((scheme_and_host, _)) = server.rsplit_once(':') {
        if scheme_and_host.contains("://") {
            return format!("{scheme_and_host}:{port}");
        }
    }
    format!("{server}:{port}")
}
