//! Credential providers for the two `collect` auth modes (§6 CLI:
//! `collect {azcli|spn}`).
//!
//! Neither mode is an interactive browser consent flow: `azcli` piggybacks
//! on credentials the operator already obtained via `az login`, and `spn`
//! performs a non-interactive OAuth2 client-credentials grant for a
//! registered service principal.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use oauth2::{
    basic::BasicClient, ClientId, ClientSecret, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use stormspotter_core::domain::Token;
use stormspotter_core::ports::ICredentialProvider;

/// Fetches tokens by shelling out to the Azure CLI's own cached login
/// session (`az account get-access-token`), mirroring how
/// `azure.identity.aio.AzureCliCredential` is used for the `cli` auth mode
/// in the collector this is ported from.
///
/// Requires the operator to have already run `az login`; this provider
/// performs no interactive authentication of its own.
#[derive(Debug, Clone, Default)]
pub struct AzCliCredentialProvider;

impl AzCliCredentialProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct AzCliTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "expiresOn")]
    expires_on: String,
}

/// Parses the `az account get-access-token` `expiresOn` field, a naive
/// local timestamp like `2026-08-01 20:15:00.000000`.
fn parse_az_cli_expiry(expires_on: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(expires_on, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(expires_on, "%Y-%m-%d %H:%M:%S"))
        .with_context(|| format!("unrecognized az cli expiresOn format: {expires_on}"))?;
    Ok(chrono::Local
        .from_local_datetime(&naive)
        .single()
        .unwrap_or_else(|| chrono::Local.from_utc_datetime(&naive))
        .with_timezone(&Utc))
}

#[async_trait]
impl ICredentialProvider for AzCliCredentialProvider {
    async fn get_token(&self, audience: &str) -> anyhow::Result<Token> {
        debug!(audience, "fetching token via az cli");

        let output = Command::new("az")
            .args(["account", "get-access-token", "--resource", audience, "--output", "json"])
            .output()
            .await
            .context("failed to invoke the az CLI; is it installed and on PATH?")?;

        if !output.status.success() {
            anyhow::bail!(
                "az account get-access-token failed for {audience}: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let parsed: AzCliTokenResponse = serde_json::from_slice(&output.stdout)
            .context("failed to parse az cli token response")?;
        let expires_at = parse_az_cli_expiry(&parsed.expires_on)?;

        info!(audience, "obtained token via az cli");
        Ok(Token::new(parsed.access_token, expires_at))
    }
}

/// Fetches tokens via a non-interactive OAuth2 client-credentials grant
/// for a registered service principal (`collect spn --tenantid --clientid
/// --secret`, §6).
pub struct SpnCredentialProvider {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    ad_authority: String,
}

impl SpnCredentialProvider {
    #[must_use]
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        ad_authority: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ad_authority: ad_authority.into(),
        }
    }
}

#[async_trait]
impl ICredentialProvider for SpnCredentialProvider {
    async fn get_token(&self, audience: &str) -> anyhow::Result<Token> {
        debug!(audience, "fetching token via service principal");

        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.ad_authority.trim_end_matches('/'),
            self.tenant_id
        );
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(TokenUrl::new(token_url).context("invalid token endpoint")?);

        let scope = format!("{}/.default", audience.trim_end_matches('/'));
        let http_client = reqwest::Client::new();
        let token_result = client
            .exchange_client_credentials()
            .add_scope(Scope::new(scope))
            .request_async(&http_client)
            .await
            .context("client-credentials token exchange failed")?;

        let expires_at = token_result
            .expires_in()
            .map(|d| Utc::now() + chrono::Duration::seconds(d.as_secs() as i64))
            .unwrap_or_else(|| Utc::now() + chrono::Duration::hours(1));

        info!(audience, "obtained token via service principal");
        Ok(Token::new(
            token_result.access_token().secret().clone(),
            expires_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_az_cli_expiry_with_fractional_seconds() {
        let dt = parse_az_cli_expiry("2026-08-01 20:15:00.000000").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2026-08-01");
    }

    #[test]
    fn parses_az_cli_expiry_without_fractional_seconds() {
        assert!(parse_az_cli_expiry("2026-08-01 20:15:00").is_ok());
    }

    #[test]
    fn rejects_garbage_expiry() {
        assert!(parse_az_cli_expiry("not a date").is_err());
    }

    #[test]
    fn az_cli_token_response_deserializes_expected_fields() {
        let json = r#"{"accessToken":"tok","expiresOn":"2026-08-01 20:15:00.000000","subscription":"sub","tenant":"ten","tokenType":"Bearer"}"#;
        let parsed: AzCliTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "tok");
    }
}
