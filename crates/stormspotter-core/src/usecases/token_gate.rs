//! The Token Gate (§4C).
//!
//! Each long-running enumerator owns one `TokenGate`. It publishes a
//! `current_token` and a binary "ready" state, backed by a background task
//! that refreshes the token 15 seconds before expiry and polls every 5
//! seconds until the refreshed token is actually valid (mirrors the
//! refresh loop in the Azure AD enumerator this is ported from: fetch,
//! sleep until `expires_on - now - 15`, clear ready, poll every 5s until
//! `expires_on > now`, set ready).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::Token;
use crate::ports::ICredentialProvider;

/// The buffer before expiry at which a cached token is considered stale
/// (§3 invariant 3, §4A, §4C).
pub const EXPIRY_BUFFER: chrono::Duration = chrono::Duration::seconds(15);

/// How long the refresh loop waits between polls once a token has expired
/// and the new one is not yet valid (§4C).
pub const REFRESH_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// Pauses an enumerator's requests across token rotation without dropping
/// or reordering in-flight work.
///
/// Cloning a `TokenGate` is cheap and shares the same background refresh
/// task and ready state; drop the last clone (or call
/// [`TokenGate::shutdown`]) to cancel it, per §5: "Cancellation of the
/// enumerator cancels the background task."
pub struct TokenGate {
    audience: String,
    ready_rx: watch::Receiver<bool>,
    token_rx: watch::Receiver<Option<Token>>,
    refresh_task: Arc<JoinHandle<()>>,
}

impl TokenGate {
    /// Starts the background refresh task for `audience` and returns a
    /// gate once the first token has been fetched.
    ///
    /// # Errors
    /// Returns an error if the initial token fetch fails (§7: `AuthFailure`
    /// is fatal for the containing subsystem).
    pub async fn start(
        credential: Arc<dyn ICredentialProvider>,
        audience: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let audience = audience.into();
        let initial = credential.get_token(&audience).await?;

        let (ready_tx, ready_rx) = watch::channel(true);
        let (token_tx, token_rx) = watch::channel(Some(initial));

        let task_audience = audience.clone();
        let refresh_task = tokio::spawn(async move {
            refresh_loop(credential, task_audience, ready_tx, token_tx).await;
        });

        Ok(Self {
            audience,
            ready_rx,
            token_rx,
            refresh_task: Arc::new(refresh_task),
        })
    }

    /// Blocks until the gate is "ready", then returns the current token.
    ///
    /// Every HTTP call an enumerator makes begins with this (§4C: "Before
    /// issuing any request, an enumerator awaits 'ready'").
    ///
    /// # Errors
    /// Returns an error if the refresh task has stopped without ever
    /// reporting ready again (the watch channel's sender was dropped).
    pub async fn wait_for_token(&mut self) -> anyhow::Result<Token> {
        loop {
            if *self.ready_rx.borrow() {
                if let Some(token) = self.token_rx.borrow().clone() {
                    return Ok(token);
                }
            }
            self.ready_rx
                .changed()
                .await
                .map_err(|_| anyhow::anyhow!("token gate for {} shut down", self.audience))?;
        }
    }

    /// Cancels the background refresh task.
    pub fn shutdown(&self) {
        self.refresh_task.abort();
    }

    /// The audience this gate was started for.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }
}

impl Clone for TokenGate {
    fn clone(&self) -> Self {
        Self {
            audience: self.audience.clone(),
            ready_rx: self.ready_rx.clone(),
            token_rx: self.token_rx.clone(),
            refresh_task: Arc::clone(&self.refresh_task),
        }
    }
}

async fn refresh_loop(
    credential: Arc<dyn ICredentialProvider>,
    audience: String,
    ready_tx: watch::Sender<bool>,
    token_tx: watch::Sender<Option<Token>>,
) {
    loop {
        let expires_at = match token_tx.borrow().as_ref() {
            Some(token) => token.expires_at,
            None => Utc::now(),
        };

        let sleep_for = (expires_at - Utc::now() - EXPIRY_BUFFER)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        tokio::time::sleep(sleep_for).await;

        if ready_tx.send(false).is_err() {
            return;
        }
        warn!(audience = %audience, "token nearing expiry, pausing enumeration");

        loop {
            match credential.get_token(&audience).await {
                Ok(token) => {
                    let valid = token.expires_at > Utc::now();
                    let _ = token_tx.send(Some(token));
                    if valid {
                        break;
                    }
                }
                Err(err) => {
                    warn!(audience = %audience, error = %err, "token refresh failed, retrying");
                }
            }
            tokio::time::sleep(REFRESH_POLL_INTERVAL).await;
        }

        if ready_tx.send(true).is_err() {
            return;
        }
        info!(audience = %audience, "resuming enumeration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeCredential {
        tokens: Mutex<Vec<Token>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ICredentialProvider for FakeCredential {
        async fn get_token(&self, _audience: &str) -> anyhow::Result<Token> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut tokens = self.tokens.lock().unwrap();
            if tokens.len() > 1 {
                Ok(tokens.remove(0))
            } else {
                Ok(tokens[0].clone())
            }
        }
    }

    #[tokio::test]
    async fn wait_for_token_returns_immediately_when_fresh() {
        let credential = Arc::new(FakeCredential {
            tokens: Mutex::new(vec![Token::new("t1", Utc::now() + chrono::Duration::hours(1))]),
            calls: AtomicUsize::new(0),
        });
        let mut gate = TokenGate::start(credential, "arm").await.unwrap();
        let token = gate.wait_for_token().await.unwrap();
        assert_eq!(token.access_token, "t1");
        gate.shutdown();
    }

    #[tokio::test]
    async fn gate_observes_a_pause_and_resume_on_rotation() {
        let credential = Arc::new(FakeCredential {
            tokens: Mutex::new(vec![
                Token::new("expiring", Utc::now() + chrono::Duration::milliseconds(50)),
                Token::new("fresh", Utc::now() + chrono::Duration::hours(1)),
            ]),
            calls: AtomicUsize::new(0),
        });
        let mut gate = TokenGate::start(Arc::clone(&credential) as Arc<dyn ICredentialProvider>, "arm")
            .await
            .unwrap();

        let first = gate.wait_for_token().await.unwrap();
        assert_eq!(first.access_token, "expiring");

        // Wait past expiry; the refresh task should fetch "fresh" and set ready again.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let second = gate.wait_for_token().await.unwrap();
        assert_eq!(second.access_token, "fresh");
        gate.shutdown();
    }
}
