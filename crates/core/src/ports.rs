//! Port interfaces for the sync pipeline

use async_trait::async_trait;
use outlooksync_domain::{
    CalendarSummary, DirectoryUser, EventRow, RawCalendarEvent, Result, SignedInUser,
};

/// Source of bearer tokens for the calendar API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Establish the credential. Idempotent: once it succeeded, later calls
    /// return immediately without contacting the identity provider.
    async fn authenticate(&self) -> Result<()>;

    /// Current access token, authenticating first if needed.
    async fn access_token(&self) -> Result<String>;
}

/// Remote calendar API.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch every event of the mailbox's default calendar, following
    /// pagination until exhausted.
    async fn fetch_events(&self, mailbox: &str) -> Result<Vec<RawCalendarEvent>>;

    /// List the calendars owned by the mailbox.
    async fn list_calendars(&self, mailbox: &str) -> Result<Vec<CalendarSummary>>;

    /// List the first page of directory users, ordered by display name.
    async fn list_users(&self) -> Result<Vec<DirectoryUser>>;

    /// Profile of the user the token was issued to. Only meaningful for
    /// delegated tokens.
    async fn current_user(&self) -> Result<SignedInUser>;
}

/// An open connection to the relational store.
#[async_trait]
pub trait EventStore: Send {
    /// Create the event table if it does not exist.
    async fn ensure_schema(&mut self) -> Result<()>;

    /// Insert the row, or overwrite every mutable column of the existing row
    /// with the same external id, in one atomic statement.
    async fn upsert(&mut self, row: &EventRow) -> Result<()>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens one store connection per sync run.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn EventStore>>;
}
