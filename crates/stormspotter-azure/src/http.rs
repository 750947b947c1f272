//! Shared authenticated-HTTP plumbing for the enumerators (§4D, §4E, §4F).
//!
//! Every request goes through a [`TokenGate`] first (§4C) and every
//! non-success response is classified into the §7 error taxonomy rather
//! than retried — §5: "Retries are not automatic on 5xx".

use reqwest::{Client, Method};
use serde_json::Value;

use stormspotter_core::usecases::TokenGate;

use crate::errors::CollectError;

/// A `reqwest::Client` with the workspace-wide finite timeout (§5) applied,
/// shared by every enumerator in a collection run.
#[derive(Clone)]
pub struct AzureHttp {
    client: Client,
}

impl AzureHttp {
    /// # Errors
    /// Returns an error if the underlying TLS backend cannot be initialized.
    pub fn new(request_timeout: std::time::Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }

    /// Issues an authenticated GET and parses the body as JSON.
    pub async fn get_json(&self, gate: &mut TokenGate, url: &str) -> Result<Value, CollectError> {
        self.request_json(gate, Method::GET, url, None).await
    }

    /// Issues an authenticated POST with a JSON body and parses the response
    /// as JSON (used by the AAD back-fill's `directoryObjects/getByIds`, §4D).
    pub async fn post_json(
        &self,
        gate: &mut TokenGate,
        url: &str,
        body: &Value,
    ) -> Result<Value, CollectError> {
        self.request_json(gate, Method::POST, url, Some(body)).await
    }

    /// Issues an authenticated GET and returns the raw body, used for the
    /// management-certificates XML endpoint (§4E.e).
    pub async fn get_text(&self, gate: &mut TokenGate, url: &str, extra_header: Option<(&str, &str)>) -> Result<String, CollectError> {
        let token = gate.wait_for_token().await.map_err(|source| CollectError::AuthFailure {
            audience: gate.audience().to_string(),
            source,
        })?;

        let mut request = self.client.get(url).bearer_auth(&token.access_token);
        if let Some((name, value)) = extra_header {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CollectError::from_send_error(url, &e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CollectError::from_send_error(url, &e))?;

        if let Some(err) = CollectError::from_status(url, status, &body) {
            return Err(err);
        }
        Ok(body)
    }

    async fn request_json(
        &self,
        gate: &mut TokenGate,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, CollectError> {
        let token = gate.wait_for_token().await.map_err(|source| CollectError::AuthFailure {
            audience: gate.audience().to_string(),
            source,
        })?;

        let mut request = self.client.request(method, url).bearer_auth(&token.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CollectError::from_send_error(url, &e))?;
        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| CollectError::from_send_error(url, &e))?;

        if let Some(err) = CollectError::from_status(url, status, &body_text) {
            return Err(err);
        }

        serde_json::from_str(&body_text)
            .map_err(|e| CollectError::TransportError(format!("invalid JSON from {url}: {e}")))
    }
}

/// Extracts the next-page cursor from a Graph/ARM list response, checking
/// both the v2 (`@odata.nextLink`) and v1 (`odata.nextLink`) field names.
#[must_use]
pub fn next_link(page: &Value) -> Option<String> {
    page.get("@odata.nextLink")
        .or_else(|| page.get("odata.nextLink"))
        .or_else(|| page.get("nextLink"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Extracts the `value` array from a list response body.
#[must_use]
pub fn page_values(page: &Value) -> Vec<Value> {
    page.get("value")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn next_link_prefers_odata_v2_field() {
        let page = json!({"@odata.nextLink": "https://next", "value": []});
        assert_eq!(next_link(&page), Some("https://next".to_string()));
    }

    #[test]
    fn next_link_falls_back_to_v1_field() {
        let page = json!({"odata.nextLink": "https://next-v1", "value": []});
        assert_eq!(next_link(&page), Some("https://next-v1".to_string()));
    }

    #[test]
    fn next_link_is_none_on_final_page() {
        assert_eq!(next_link(&json!({"value": []})), None);
    }

    #[test]
    fn page_values_extracts_array() {
        let page = json!({"value": [{"id": "a"}, {"id": "b"}]});
        assert_eq!(page_values(&page).len(), 2);
    }

    #[test]
    fn page_values_defaults_to_empty() {
        assert!(page_values(&json!({})).is_empty());
    }
}
