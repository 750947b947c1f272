//! The Ingestor Orchestrator (§6): unpacks an archived collection run,
//! replays each class file through the Entity Model, and drives the
//! Graph Writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use stormspotter_cache::read_class_file;
use stormspotter_core::domain::Record;
use stormspotter_core::ports::IGraphWriter;

use crate::entity::derive_entities;
use crate::errors::IngestError;

/// AAD classes are stored one-file-per-class under their own name; every
/// other class file name is either a fixed ARM bucket (`tenant`,
/// `subscription`, `rbac`, `management_certs`) or a subscription id, which
/// mixes `ResourceGroup` and `Resource` records together (§4E).
const AAD_CLASS_FILES: [&str; 5] = ["User", "Group", "ServicePrincipal", "Application", "DirectoryRole"];

/// Per-class record counts produced by one ingest run, for the end-of-run
/// summary table (§7).
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub record_counts: BTreeMap<String, i64>,
}

/// Unpacks `archive_path`, replays every class file it contains, and feeds
/// the derived nodes and edges to `writer`. When `export_json_dir` is set,
/// each record's payload is also written out as a standalone `.json` file
/// before derivation (§10.E debug aid).
///
/// # Errors
/// Returns an error if the archive cannot be extracted, contains no
/// top-level directory, or the graph writer fails to close.
pub async fn ingest_archive(
    archive_path: &Path,
    writer: Arc<dyn IGraphWriter>,
    export_json_dir: Option<&Path>,
) -> anyhow::Result<IngestSummary> {
    let extract_dir = tempfile::tempdir()?;
    let archive_path = archive_path.to_path_buf();
    let extracted_root = {
        let dest = extract_dir.path().to_path_buf();
        tokio::task::spawn_blocking(move || extract_archive(&archive_path, &dest)).await??
    };

    let mut class_files: Vec<PathBuf> = std::fs::read_dir(&extracted_root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("sqlite"))
        .collect();
    class_files.sort();

    let mut summary = IngestSummary::default();

    for path in class_files {
        let file_stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let records = match read_class_file(&path, &file_stem).await {
            Ok(records) => records,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed to read record-store file, skipping");
                continue;
            }
        };

        for record in records {
            let class = canonical_class(&file_stem, &record.payload);
            let record = Record { class: class.clone(), ..record };
            *summary.record_counts.entry(class).or_insert(0) += 1;

            if let Some(dir) = export_json_dir {
                export_record_json(dir, &record);
            }

            for derived in derive_entities(&record) {
                if let Some(node) = derived.node {
                    if let Err(err) = writer.insert_node(node).await {
                        warn!(error = %err, "failed to enqueue node insert");
                    }
                }
                for edge in derived.edges {
                    if let Err(err) = writer.insert_edge(edge).await {
                        warn!(error = %err, "failed to enqueue edge insert");
                    }
                }
            }
        }
    }

    writer.close().await?;
    info!(classes = summary.record_counts.len(), "ingest complete");
    Ok(summary)
}

fn extract_archive(archive_path: &Path, dest: &Path) -> anyhow::Result<PathBuf> {
    let file = std::fs::File::open(archive_path).map_err(|err| IngestError::ArchiveError {
        path: archive_path.display().to_string(),
        reason: err.to_string(),
    })?;
    let decoder = xz2::read::XzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(dest).map_err(|err| IngestError::ArchiveError {
        path: archive_path.display().to_string(),
        reason: err.to_string(),
    })?;

    std::fs::read_dir(dest)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| path.is_dir())
        .ok_or_else(|| {
            IngestError::ArchiveError {
                path: archive_path.display().to_string(),
                reason: "no top-level directory".to_string(),
            }
            .into()
        })
}

/// Recovers the record's original semantic class from its file name and,
/// where the file mixes classes (a subscription id's file holds both
/// `ResourceGroup` and `Resource` records), from the shape of the payload
/// itself: a resource group's `id` ends at `.../resourceGroups/{name}`,
/// while a resource's `id` continues with a `/providers/` segment.
fn canonical_class(file_stem: &str, payload: &Value) -> String {
    match file_stem {
        "tenant" => "Tenant".to_string(),
        "subscription" => "Subscription".to_string(),
        "rbac" => "Rbac".to_string(),
        "management_certs" => "ManagementCertificate".to_string(),
        class if AAD_CLASS_FILES.contains(&class) => class.to_string(),
        _ => {
            let id = payload.get("id").and_then(Value::as_str).unwrap_or_default().to_lowercase();
            if id.contains("/providers/") {
                "Resource".to_string()
            } else {
                "ResourceGroup".to_string()
            }
        }
    }
}

fn export_record_json(dir: &Path, record: &Record) {
    let class_dir = dir.join(&record.class);
    if let Err(err) = std::fs::create_dir_all(&class_dir) {
        warn!(error = %err, dir = %class_dir.display(), "failed to create export-json directory");
        return;
    }
    let file_name = format!("{}.json", record.sequence.unwrap_or_default());
    let path = class_dir.join(file_name);
    match serde_json::to_string_pretty(&record.payload) {
        Ok(json) => {
            if let Err(err) = std::fs::write(&path, json) {
                warn!(error = %err, path = %path.display(), "failed to write export-json file");
            }
        }
        Err(err) => warn!(error = %err, "failed to serialize record for export-json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixed_name_files_map_to_their_class_unconditionally() {
        assert_eq!(canonical_class("tenant", &json!({})), "Tenant");
        assert_eq!(canonical_class("subscription", &json!({})), "Subscription");
        assert_eq!(canonical_class("rbac", &json!({})), "Rbac");
        assert_eq!(canonical_class("management_certs", &json!({})), "ManagementCertificate");
    }

    #[test]
    fn aad_class_files_round_trip_their_own_name() {
        for class in AAD_CLASS_FILES {
            assert_eq!(canonical_class(class, &json!({})), class);
        }
    }

    #[test]
    fn subscription_scoped_file_disambiguates_by_id_shape() {
        let rg = json!({"id": "/subscriptions/S1/resourceGroups/RG"});
        let resource = json!({"id": "/subscriptions/S1/resourceGroups/RG/providers/Microsoft.KeyVault/vaults/V"});
        assert_eq!(canonical_class("11111111-1111-1111-1111-111111111111", &rg), "ResourceGroup");
        assert_eq!(canonical_class("11111111-1111-1111-1111-111111111111", &resource), "Resource");
    }
}
