//! OAuth 2.0 token types
//!
//! Wire shapes of the Microsoft identity platform v2.0 endpoints and the
//! token set kept by the session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Access token plus the metadata needed to renew it.
#[derive(Clone)]
pub struct TokenSet {
    pub access_token: String,

    /// Only issued by the device code grant (with `offline_access`).
    pub refresh_token: Option<String>,

    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Absolute expiration timestamp (UTC), computed on receipt
    pub expires_at: Option<DateTime<Utc>>,

    pub scope: Option<String>,
}

impl TokenSet {
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        let expires_at =
            (expires_in > 0).then(|| Utc::now() + chrono::Duration::seconds(expires_in));

        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at,
            scope,
        }
    }

    /// Check if the access token is expired or will expire within
    /// `threshold_seconds`.
    ///
    /// A token without an expiry is treated as valid.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at
            }
            None => false,
        }
    }

    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Successful response of the `/token` endpoint.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
    pub scope: Option<String>,
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self::new(response.access_token, response.refresh_token, response.expires_in, response.scope)
    }
}

/// Error body shared by the `/token` and `/devicecode` endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

/// Response of the `/devicecode` endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds before `device_code` stops being accepted.
    pub expires_in: u64,
    /// Minimum polling interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub interval: u64,
    /// Ready-made sign-in instructions.
    pub message: Option<String>,
}

impl DeviceCodeResponse {
    pub fn instructions(&self) -> String {
        self.message.clone().unwrap_or_else(|| {
            format!(
                "To sign in, use a web browser to open the page {} and enter the code {} to \
                 authenticate.",
                self.verification_uri, self.user_code
            )
        })
    }
}

fn default_poll_interval() -> u64 {
    5
}
