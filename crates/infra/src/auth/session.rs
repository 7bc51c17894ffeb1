//! Process-wide Graph credential cache.

use async_trait::async_trait;
use outlooksync_core::TokenProvider;
use outlooksync_domain::{Result, SyncError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::credential::Credential;
use super::types::TokenSet;
use crate::http::HttpClient;

/// Renew tokens this many seconds before they actually expire.
const EXPIRY_THRESHOLD_SECS: i64 = 300;

enum SessionState {
    Uninitialized,
    Ready(TokenSet),
    Failed(SyncError),
}

/// Owns the credential for one process.
///
/// The first call authenticates (prompting in device mode); later calls reuse
/// the cached token and renew it silently once it nears expiry. A failure is
/// remembered: the session never prompts twice.
pub struct GraphSession {
    http: HttpClient,
    credential: Box<dyn Credential>,
    state: Mutex<SessionState>,
}

impl GraphSession {
    pub fn new(http: HttpClient, credential: Box<dyn Credential>) -> Self {
        Self { http, credential, state: Mutex::new(SessionState::Uninitialized) }
    }

    /// Label of the current state, for diagnostics.
    pub async fn state_label(&self) -> &'static str {
        match &*self.state.lock().await {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready(_) => "ready",
            SessionState::Failed(_) => "failed",
        }
    }

    async fn token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        match &*state {
            SessionState::Failed(err) => return Err(err.clone()),
            SessionState::Ready(tokens) if !tokens.is_expired(EXPIRY_THRESHOLD_SECS) => {
                return Ok(tokens.access_token.clone());
            }
            _ => {}
        }

        let previous = std::mem::replace(&mut *state, SessionState::Uninitialized);
        let outcome = match &previous {
            SessionState::Ready(expired) => {
                debug!(credential = self.credential.kind(), "renewing expired access token");
                self.credential.renew(&self.http, expired).await
            }
            _ => {
                info!(credential = self.credential.kind(), "authenticating with identity provider");
                self.credential.acquire(&self.http).await
            }
        };

        match outcome {
            Ok(tokens) => {
                debug!(expires_in = tokens.seconds_until_expiry(), "access token ready");
                let access_token = tokens.access_token.clone();
                *state = SessionState::Ready(tokens);
                Ok(access_token)
            }
            Err(err) => {
                let err = match err {
                    SyncError::Auth(_) => err,
                    other => SyncError::Auth(other.message().to_string()),
                };
                warn!(credential = self.credential.kind(), error = %err, "authentication failed");
                *state = SessionState::Failed(err.clone());
                Err(err)
            }
        }
    }
}

#[async_trait]
impl TokenProvider for GraphSession {
    async fn authenticate(&self) -> Result<()> {
        self.token().await.map(|_| ())
    }

    async fn access_token(&self) -> Result<String> {
        self.token().await
    }
}
