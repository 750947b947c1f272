//! A bearer token with a redacted `Debug` impl.
//!
//! Tokens are passed through logs-adjacent code constantly (every enumerator
//! holds one); a derived `Debug` would eventually leak one into a log line.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An OAuth2 bearer token scoped to one audience, with its expiry.
#[derive(Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Returns true while more than `buffer` remains before expiry.
    ///
    /// The Credential Provider (§4A) treats a token as usable "while
    /// `expires_at - now > 15s`"; callers pass that buffer explicitly so
    /// the Token Gate (§4C), which uses the same 15s threshold for a
    /// different purpose (deciding when to start a refresh), can share
    /// this helper without coupling the two constants together.
    #[must_use]
    pub fn is_valid_with_buffer(&self, now: DateTime<Utc>, buffer: chrono::Duration) -> bool {
        self.expires_at - now > buffer
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn debug_redacts_access_token() {
        let token = Token::new("secret-value", Utc::now());
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn validity_respects_buffer() {
        let now = Utc::now();
        let token = Token::new("t", now + Duration::seconds(20));
        assert!(token.is_valid_with_buffer(now, Duration::seconds(15)));
        assert!(!token.is_valid_with_buffer(now, Duration::seconds(25)));
    }
}
