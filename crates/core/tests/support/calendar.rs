use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use outlooksync_core::{EventSource, EventStore, StoreConnector, TokenProvider};
use outlooksync_domain::{
    CalendarSummary, DirectoryUser, EventRow, RawCalendarEvent, Result as DomainResult,
    SignedInUser, SyncError,
};

/// Build a complete remote record.
pub fn raw_event(id: &str, subject: &str) -> RawCalendarEvent {
    RawCalendarEvent {
        id: Some(id.to_string()),
        subject: Some(subject.to_string()),
        body: Some(format!("body of {id}")),
        change_key: Some(format!("ck-{id}")),
        organizer_name: Some("Organizer".to_string()),
        start: Some("2024-05-01T09:00:00.0000000".to_string()),
        end: Some("2024-05-01T10:00:00.0000000".to_string()),
        show_as: Some("busy".to_string()),
        ..RawCalendarEvent::default()
    }
}

/// Token provider that counts authentications and can be told to fail.
#[derive(Default)]
pub struct MockTokenProvider {
    pub calls: AtomicUsize,
    pub fail_with: Option<SyncError>,
}

impl MockTokenProvider {
    pub fn failing(err: SyncError) -> Self {
        Self { calls: AtomicUsize::new(0), fail_with: Some(err) }
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn authenticate(&self) -> DomainResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn access_token(&self) -> DomainResult<String> {
        self.authenticate().await.map(|()| "token".to_string())
    }
}

/// Event source returning one scripted response per `fetch_events` call.
#[derive(Default)]
pub struct ScriptedEventSource {
    responses: Mutex<VecDeque<DomainResult<Vec<RawCalendarEvent>>>>,
}

impl ScriptedEventSource {
    pub fn new(responses: Vec<DomainResult<Vec<RawCalendarEvent>>>) -> Self {
        Self { responses: Mutex::new(responses.into()) }
    }
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    async fn fetch_events(&self, _mailbox: &str) -> DomainResult<Vec<RawCalendarEvent>> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::RemoteQuery("no scripted response left".into())))
    }

    async fn list_calendars(&self, mailbox: &str) -> DomainResult<Vec<CalendarSummary>> {
        Ok(vec![CalendarSummary {
            name: "Calendar".to_string(),
            owner_name: Some("Owner".to_string()),
            owner_address: Some(mailbox.to_string()),
        }])
    }

    async fn list_users(&self) -> DomainResult<Vec<DirectoryUser>> {
        Ok(Vec::new())
    }

    async fn current_user(&self) -> DomainResult<SignedInUser> {
        Ok(SignedInUser {
            display_name: Some("Signed In".to_string()),
            mail: None,
            user_principal_name: Some("signed.in@example.com".to_string()),
        })
    }
}

/// Shared table contents, keyed by external id.
pub type Table = Arc<Mutex<BTreeMap<String, EventRow>>>;

/// In-memory store with upsert semantics, shared across connections.
#[derive(Default, Clone)]
pub struct InMemoryConnector {
    pub table: Table,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub refuse_connections: bool,
    pub rejected_ids: Arc<HashSet<String>>,
}

impl InMemoryConnector {
    pub fn refusing() -> Self {
        Self { refuse_connections: true, ..Self::default() }
    }

    pub fn rejecting(ids: &[&str]) -> Self {
        Self {
            rejected_ids: Arc::new(ids.iter().map(|id| (*id).to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> BTreeMap<String, EventRow> {
        self.table.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreConnector for InMemoryConnector {
    async fn connect(&self) -> DomainResult<Box<dyn EventStore>> {
        if self.refuse_connections {
            return Err(SyncError::Write("connection refused".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryStore {
            table: Arc::clone(&self.table),
            closed: Arc::clone(&self.closed),
            rejected_ids: Arc::clone(&self.rejected_ids),
        }))
    }
}

pub struct InMemoryStore {
    table: Table,
    closed: Arc<AtomicUsize>,
    rejected_ids: Arc<HashSet<String>>,
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn ensure_schema(&mut self) -> DomainResult<()> {
        Ok(())
    }

    async fn upsert(&mut self, row: &EventRow) -> DomainResult<()> {
        if self.rejected_ids.contains(&row.external_id) {
            return Err(SyncError::Write(format!("constraint violation for {}", row.external_id)));
        }
        self.table.lock().unwrap().insert(row.external_id.clone(), row.clone());
        Ok(())
    }

    async fn close(self: Box<Self>) -> DomainResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
