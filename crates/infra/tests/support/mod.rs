#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use outlooksync_domain::{GraphConfig, GraphCredentials};
use outlooksync_infra::{credential_for, GraphClient, GraphSession, HttpClient};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "tenant-1";
pub const MAILBOX: &str = "room-42@example.com";

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness once per binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::new(
            "outlooksync_core=debug,outlooksync_infra=debug",
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// App-only Graph settings pointing both endpoints at `server`.
pub fn graph_config(server: &MockServer) -> GraphConfig {
    let mut config = GraphConfig::new(GraphCredentials::ClientSecret {
        tenant_id: TENANT.to_string(),
        client_id: "client-123".to_string(),
        client_secret: "s3cret".to_string(),
    });
    config.api_base_url = format!("{}/v1.0", server.uri());
    config.authority_url = server.uri();
    config
}

/// Session plus Graph client wired the way the binary wires them.
pub fn graph_stack(server: &MockServer) -> (Arc<GraphSession>, Arc<GraphClient>) {
    let config = graph_config(server);
    let http = HttpClient::new().expect("http client");
    let session = Arc::new(GraphSession::new(
        http.clone(),
        credential_for(&config, Arc::new(|_: &str| {})),
    ));
    let client = Arc::new(GraphClient::new(http, session.clone(), &config.api_base_url));
    (session, client)
}

/// Answer the client credentials grant, expecting `calls` requests.
pub async fn mount_token_endpoint(server: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "graph-token"
        })))
        .expect(calls)
        .mount(server)
        .await;
}

pub fn events_path() -> String {
    format!("/v1.0/users/{MAILBOX}/calendar/events")
}

/// Graph event JSON with the fields the sync reads.
pub fn graph_event(uid: &str, subject: &str) -> Value {
    json!({
        "iCalUId": uid,
        "subject": subject,
        "body": {"contentType": "text", "content": format!("notes for {subject}")},
        "bodyPreview": "notes",
        "categories": [],
        "changeKey": format!("ck-{uid}"),
        "organizer": {"emailAddress": {"name": "Ada Lovelace", "address": "ada@example.com"}},
        "attendees": [],
        "start": {"dateTime": "2024-05-01T09:00:00.0000000", "timeZone": "UTC"},
        "end": {"dateTime": "2024-05-01T10:00:00.0000000", "timeZone": "UTC"},
        "location": {"displayName": "Room 42"},
        "isAllDay": false,
        "showAs": "busy"
    })
}

/// Temporary SQLite file that lives as long as the returned guard.
pub struct TempStore {
    pub path: PathBuf,
    _dir: TempDir,
}

impl TempStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        Self { path: dir.path().join("events.db"), _dir: dir }
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}
