//! The ingestor-side error taxonomy (§7), mirroring
//! `stormspotter_azure::errors::CollectError` on the write side.

use thiserror::Error;

/// Errors the ingest path can raise. Only `AuthFailure` and `ArchiveError`
/// are fatal for the CLI process (§7, §6 "non-zero for unrecoverable
/// authentication or driver failures"); `ParseFailure` and
/// `GraphSyntaxError` are logged and skipped by the caller inline, never
/// surfaced through this enum.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to connect to the graph driver at {uri}: {source}")]
    AuthFailure {
        uri: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed archive {path}: {reason}")]
    ArchiveError { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_message_includes_uri() {
        let err = IngestError::AuthFailure {
            uri: "bolt://127.0.0.1:7687".to_string(),
            source: anyhow::anyhow!("connection refused"),
        };
        assert!(err.to_string().contains("bolt://127.0.0.1:7687"));
    }

    #[test]
    fn archive_error_message_includes_path() {
        let err = IngestError::ArchiveError {
            path: "results.tar.xz".to_string(),
            reason: "no top-level directory".to_string(),
        };
        assert!(err.to_string().contains("results.tar.xz"));
    }
}
