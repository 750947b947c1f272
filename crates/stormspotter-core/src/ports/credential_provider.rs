//! The Credential Provider port (§4A).
//!
//! Implementations obtain and cache bearer tokens per audience and must be
//! safe to call from many concurrent enumerators (one Token Gate per
//! enumerator, all sharing the same provider instance).

use async_trait::async_trait;

use crate::domain::Token;

/// Obtains and refreshes bearer tokens for a small, fixed set of audiences
/// (ARM, Microsoft Graph, classic Management, or a custom-configured cloud
/// endpoint).
///
/// The cache behavior ("returns the cached [token] while
/// `expires_at - now > 15s`; otherwise it requests a new one") is a
/// contractual property of the implementation, not something callers
/// re-derive — callers simply call `get_token` before every request.
#[async_trait]
pub trait ICredentialProvider: Send + Sync {
    /// Returns a valid token for `audience`, refreshing it if the cached
    /// one is within 15 seconds of expiry.
    ///
    /// # Errors
    /// Returns an error on authentication failure against the identity
    /// provider (§7: `AuthFailure`, fatal for the containing subsystem).
    async fn get_token(&self, audience: &str) -> anyhow::Result<Token>;
}
