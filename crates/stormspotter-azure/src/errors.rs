//! The collector-side error taxonomy (§7).

use thiserror::Error;

/// Errors an enumerator can raise. Only `AuthFailure` is fatal for the
/// containing subsystem (§7); every other variant is logged by the caller
/// and the offending item is skipped.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("authentication failed for {audience}: {source}")]
    AuthFailure {
        audience: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("no supported api version remains for {resource_id}")]
    ApiVersionExhausted { resource_id: String },

    #[error("transport error: {0}")]
    TransportError(String),
}

impl CollectError {
    /// Wraps a failed `send()` as a `TransportError` (§7: "Log, skip the item").
    #[must_use]
    pub fn from_send_error(url: &str, err: &reqwest::Error) -> Self {
        Self::TransportError(format!("{url}: {err}"))
    }

    /// Classifies a non-success HTTP status into the §7 taxonomy.
    /// Returns `None` for a successful response.
    #[must_use]
    pub fn from_status(url: &str, status: reqwest::StatusCode, body: &str) -> Option<Self> {
        if status.is_success() {
            None
        } else if status == reqwest::StatusCode::FORBIDDEN {
            Some(Self::PermissionDenied(format!("{url}: {body}")))
        } else {
            Some(Self::TransportError(format!("{url}: {status} {body}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn success_status_yields_no_error() {
        assert!(CollectError::from_status("u", StatusCode::OK, "").is_none());
    }

    #[test]
    fn forbidden_maps_to_permission_denied() {
        let err = CollectError::from_status("u", StatusCode::FORBIDDEN, "nope").unwrap();
        assert!(matches!(err, CollectError::PermissionDenied(_)));
    }

    #[test]
    fn other_failure_maps_to_transport_error() {
        let err = CollectError::from_status("u", StatusCode::BAD_GATEWAY, "down").unwrap();
        assert!(matches!(err, CollectError::TransportError(_)));
    }
}
