//! OAuth 2.0 grants against the Microsoft identity platform.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use outlooksync_domain::constants::GRAPH_DEFAULT_SCOPE;
use outlooksync_domain::{GraphConfig, GraphCredentials, Result, SyncError};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use super::types::{DeviceCodeResponse, TokenErrorResponse, TokenResponse, TokenSet};
use crate::http::HttpClient;

/// Callback that shows device sign-in instructions to the user.
pub type DevicePrompt = Arc<dyn Fn(&str) + Send + Sync>;

/// Extra wait requested by the identity provider on `slow_down`.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// A way of obtaining Graph tokens.
#[async_trait]
pub trait Credential: Send + Sync {
    /// Short label used in logs.
    fn kind(&self) -> &'static str;

    /// Obtain a first token set.
    async fn acquire(&self, http: &HttpClient) -> Result<TokenSet>;

    /// Replace an expired token set without user interaction.
    async fn renew(&self, http: &HttpClient, expired: &TokenSet) -> Result<TokenSet>;
}

/// Pick the credential matching the configured auth mode.
pub fn credential_for(config: &GraphConfig, prompt: DevicePrompt) -> Box<dyn Credential> {
    match &config.credentials {
        GraphCredentials::ClientSecret { tenant_id, client_id, client_secret } => {
            Box::new(ClientSecretCredential::new(
                &config.authority_url,
                tenant_id,
                client_id,
                client_secret,
            ))
        }
        GraphCredentials::DeviceCode { tenant_id, client_id, scopes } => Box::new(
            DeviceCodeCredential::new(&config.authority_url, tenant_id, client_id, scopes)
                .with_prompt(prompt),
        ),
    }
}

/// Application credential (client credentials grant).
pub struct ClientSecretCredential {
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    pub fn new(authority_url: &str, tenant_id: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            token_url: endpoint(authority_url, tenant_id, "token"),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

#[async_trait]
impl Credential for ClientSecretCredential {
    fn kind(&self) -> &'static str {
        "client_credentials"
    }

    #[instrument(skip_all)]
    async fn acquire(&self, http: &HttpClient) -> Result<TokenSet> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", GRAPH_DEFAULT_SCOPE),
        ];
        request_token(http, &self.token_url, &form).await.map_err(TokenEndpointError::into_auth)
    }

    async fn renew(&self, http: &HttpClient, _expired: &TokenSet) -> Result<TokenSet> {
        self.acquire(http).await
    }
}

/// Delegated credential (device authorization grant).
pub struct DeviceCodeCredential {
    device_code_url: String,
    token_url: String,
    client_id: String,
    scope: String,
    prompt: DevicePrompt,
}

impl DeviceCodeCredential {
    pub fn new(authority_url: &str, tenant_id: &str, client_id: &str, scopes: &[String]) -> Self {
        Self {
            device_code_url: endpoint(authority_url, tenant_id, "devicecode"),
            token_url: endpoint(authority_url, tenant_id, "token"),
            client_id: client_id.to_string(),
            scope: scope_string(scopes),
            prompt: Arc::new(|message: &str| info!(target: "outlooksync::auth", "{message}")),
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: DevicePrompt) -> Self {
        self.prompt = prompt;
        self
    }

    async fn poll(&self, http: &HttpClient, device: &DeviceCodeResponse) -> Result<TokenSet> {
        let deadline = Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = Duration::from_secs(device.interval);
        let form = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            ("client_id", self.client_id.as_str()),
            ("device_code", device.device_code.as_str()),
        ];

        loop {
            tokio::time::sleep(interval).await;

            match request_token(http, &self.token_url, &form).await {
                Ok(tokens) => return Ok(tokens),
                Err(TokenEndpointError::Pending) => debug!("device sign-in still pending"),
                Err(TokenEndpointError::SlowDown) => {
                    interval += SLOW_DOWN_STEP;
                    debug!(interval_secs = interval.as_secs(), "identity provider asked to slow down");
                }
                Err(TokenEndpointError::Fatal(err)) => return Err(err),
            }

            if Instant::now() >= deadline {
                return Err(SyncError::Auth(
                    "device code expired before sign-in was completed".into(),
                ));
            }
        }
    }
}

#[async_trait]
impl Credential for DeviceCodeCredential {
    fn kind(&self) -> &'static str {
        "device_code"
    }

    #[instrument(skip_all)]
    async fn acquire(&self, http: &HttpClient) -> Result<TokenSet> {
        let request = http
            .post(&self.device_code_url)
            .form(&[("client_id", self.client_id.as_str()), ("scope", self.scope.as_str())]);
        let response = http.send(request).await.map_err(into_auth)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(rejected(status, &body));
        }

        let device: DeviceCodeResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Auth(format!("malformed device code response: {err}")))?;

        (self.prompt)(&device.instructions());
        self.poll(http, &device).await
    }

    async fn renew(&self, http: &HttpClient, expired: &TokenSet) -> Result<TokenSet> {
        let Some(refresh_token) = expired.refresh_token.as_deref() else {
            return Err(SyncError::Auth(
                "access token expired and no refresh token was issued".into(),
            ));
        };

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("scope", self.scope.as_str()),
        ];
        let mut renewed = request_token(http, &self.token_url, &form)
            .await
            .map_err(TokenEndpointError::into_auth)?;

        // Refresh responses may omit a new refresh token.
        if renewed.refresh_token.is_none() {
            renewed.refresh_token = Some(refresh_token.to_string());
        }
        Ok(renewed)
    }
}

#[derive(Debug, thiserror::Error)]
enum TokenEndpointError {
    #[error("authorization pending")]
    Pending,
    #[error("slow down")]
    SlowDown,
    #[error(transparent)]
    Fatal(#[from] SyncError),
}

impl TokenEndpointError {
    fn into_auth(self) -> SyncError {
        match self {
            Self::Fatal(err) => err,
            other => SyncError::Auth(other.to_string()),
        }
    }
}

async fn request_token(
    http: &HttpClient,
    url: &str,
    form: &[(&str, &str)],
) -> std::result::Result<TokenSet, TokenEndpointError> {
    let response = http.send(http.post(url).form(form)).await.map_err(into_auth)?;
    let status = response.status();

    if status.is_success() {
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Auth(format!("malformed token response: {err}")))?;
        return Ok(body.into());
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<TokenErrorResponse>(&body) {
        Ok(err) if err.error == "authorization_pending" => Err(TokenEndpointError::Pending),
        Ok(err) if err.error == "slow_down" => Err(TokenEndpointError::SlowDown),
        _ => Err(rejected(status, &body).into()),
    }
}

fn rejected(status: reqwest::StatusCode, body: &str) -> SyncError {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse { error, error_description: Some(description) }) => {
            SyncError::Auth(format!("{error}: {}", first_line(&description)))
        }
        Ok(TokenErrorResponse { error, error_description: None }) => SyncError::Auth(error),
        Err(_) => SyncError::Auth(format!("identity provider returned HTTP {}", status.as_u16())),
    }
}

/// Identity provider descriptions append trace ids on later lines.
fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}

fn into_auth(err: SyncError) -> SyncError {
    match err {
        SyncError::Auth(_) => err,
        other => SyncError::Auth(format!("identity provider unreachable: {}", other.message())),
    }
}

fn endpoint(authority_url: &str, tenant_id: &str, action: &str) -> String {
    format!("{}/{tenant_id}/oauth2/v2.0/{action}", authority_url.trim_end_matches('/'))
}

/// Space separated scopes, with `offline_access` so a refresh token is issued.
fn scope_string(scopes: &[String]) -> String {
    let mut all: Vec<&str> = scopes.iter().map(String::as_str).collect();
    if !all.iter().any(|s| s.eq_ignore_ascii_case("offline_access")) {
        all.push("offline_access");
    }
    all.join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn token_body(token: &str) -> serde_json::Value {
        serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": token,
            "refresh_token": "rt-1"
        })
    }

    #[tokio::test]
    async fn client_credentials_posts_default_scope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_secret=s3cret"))
            .and(body_string_contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("app-token")))
            .expect(1)
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new(&server.uri(), "tenant-1", "client", "s3cret");
        let tokens = credential.acquire(&HttpClient::new().unwrap()).await.unwrap();

        assert_eq!(tokens.access_token, "app-token");
        assert!(!tokens.is_expired(300));
    }

    #[tokio::test]
    async fn rejected_client_secret_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 1"
            })))
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new(&server.uri(), "tenant-1", "client", "bad");
        let err = credential.acquire(&HttpClient::new().unwrap()).await.unwrap_err();

        match err {
            SyncError::Auth(message) => {
                assert!(message.starts_with("invalid_client: AADSTS7000215"));
                assert!(!message.contains("Trace ID"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn device_code_prompts_then_polls_until_granted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/devicecode"))
            .and(body_string_contains("offline_access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "device_code": "dc-1",
                "user_code": "QWER-TY12",
                "verification_uri": "https://microsoft.com/devicelogin",
                "expires_in": 900,
                "interval": 0,
                "message": "Open the page and enter QWER-TY12"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "authorization_pending"
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("device_code=dc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("user-token")))
            .expect(1)
            .mount(&server)
            .await;

        let shown = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&shown);
        let credential = DeviceCodeCredential::new(
            &server.uri(),
            "common",
            "client",
            &["Calendars.Read".to_string()],
        )
        .with_prompt(Arc::new(move |message: &str| sink.lock().unwrap().push(message.into())));

        let tokens = credential.acquire(&HttpClient::new().unwrap()).await.unwrap();

        assert_eq!(tokens.access_token, "user-token");
        assert_eq!(shown.lock().unwrap().as_slice(), ["Open the page and enter QWER-TY12"]);
    }

    #[tokio::test]
    async fn declined_device_sign_in_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/devicecode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "device_code": "dc-1",
                "user_code": "QWER-TY12",
                "verification_uri": "https://microsoft.com/devicelogin",
                "expires_in": 900,
                "interval": 0
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "authorization_declined",
                "error_description": "The end user denied the authorization request."
            })))
            .mount(&server)
            .await;

        let credential = DeviceCodeCredential::new(&server.uri(), "common", "client", &[])
            .with_prompt(Arc::new(|_: &str| {}));
        let err = credential.acquire(&HttpClient::new().unwrap()).await.unwrap_err();

        assert!(matches!(err, SyncError::Auth(ref m) if m.starts_with("authorization_declined")));
    }

    #[tokio::test]
    async fn device_renewal_uses_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "renewed",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = DeviceCodeCredential::new(&server.uri(), "common", "client", &[]);
        let expired = TokenSet::new("old".into(), Some("rt-0".into()), 1, None);
        let renewed = credential.renew(&HttpClient::new().unwrap(), &expired).await.unwrap();

        assert_eq!(renewed.access_token, "renewed");
        assert_eq!(renewed.refresh_token.as_deref(), Some("rt-0"));
    }

    #[tokio::test]
    async fn unreachable_identity_provider_is_an_auth_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let credential =
            ClientSecretCredential::new(&format!("http://{addr}"), "tenant", "client", "secret");
        let err = credential.acquire(&HttpClient::new().unwrap()).await.unwrap_err();

        assert_eq!(err.stage(), "auth");
    }

    #[test]
    fn scope_string_adds_offline_access_once() {
        assert_eq!(
            scope_string(&["User.Read".into(), "Calendars.Read".into()]),
            "User.Read Calendars.Read offline_access"
        );
        assert_eq!(scope_string(&["offline_access".into()]), "offline_access");
    }

    #[test]
    fn endpoint_joins_authority_and_tenant() {
        assert_eq!(
            endpoint("https://login.microsoftonline.com/", "abc", "devicecode"),
            "https://login.microsoftonline.com/abc/oauth2/v2.0/devicecode"
        );
    }
}
