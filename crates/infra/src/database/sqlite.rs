//! SQLite event store
//!
//! Local-file store sharing the Postgres schema and upsert semantics. The
//! table is created on open.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use outlooksync_core::{EventStore, StoreConnector};
use outlooksync_domain::{EventRow, Result, SyncError};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, instrument, warn};

use super::schema::{COUNT_EVENTS, CREATE_EVENT_TABLE, SELECT_EVENT_SQLITE, UPSERT_EVENT_SQLITE};
use crate::errors::InfraError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens one [`SqliteEventStore`] per sync run.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StoreConnector for SqliteConnector {
    async fn connect(&self) -> Result<Box<dyn EventStore>> {
        Ok(Box::new(SqliteEventStore::open(&self.path)?))
    }
}

/// One open SQLite connection.
pub struct SqliteEventStore {
    conn: Connection,
}

impl SqliteEventStore {
    /// Open (creating if needed) the database file and its table.
    ///
    /// # Errors
    /// Returns `SyncError::Write` if the file cannot be opened or the schema
    /// cannot be created.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(to_sync)?;
        let store = Self::init(conn)?;
        debug!(path = %path.display(), "sqlite store opened");
        Ok(store)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `SyncError::Write` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(to_sync)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(to_sync)?;
        conn.execute_batch(CREATE_EVENT_TABLE).map_err(to_sync)?;
        Ok(Self { conn })
    }

    /// Insert or overwrite one row.
    ///
    /// # Errors
    /// Returns `SyncError::Write` on constraint or I/O failures.
    pub fn upsert_row(&self, row: &EventRow) -> Result<()> {
        self.conn
            .execute(
                UPSERT_EVENT_SQLITE,
                params![
                    row.external_id,
                    row.subject,
                    row.body,
                    row.change_key,
                    row.organizer,
                    row.start_time,
                    row.end_time,
                    row.show_as,
                ],
            )
            .map_err(to_sync)?;
        Ok(())
    }

    /// Fetch one row by external id.
    ///
    /// # Errors
    /// Returns `SyncError::Write` if the query fails.
    pub fn get(&self, external_id: &str) -> Result<Option<EventRow>> {
        self.conn
            .query_row(SELECT_EVENT_SQLITE, params![external_id], |row| {
                Ok(EventRow {
                    external_id: row.get(0)?,
                    subject: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    body: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    change_key: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    organizer: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    start_time: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    end_time: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    show_as: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                })
            })
            .optional()
            .map_err(to_sync)
    }

    /// Number of rows in the table.
    ///
    /// # Errors
    /// Returns `SyncError::Write` if the query fails.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(COUNT_EVENTS, [], |row| row.get(0)).map_err(to_sync)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(CREATE_EVENT_TABLE).map_err(to_sync)
    }

    async fn upsert(&mut self, row: &EventRow) -> Result<()> {
        self.upsert_row(row)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_conn, err)| {
            warn!(error = %err, "sqlite connection did not close cleanly");
            to_sync(err)
        })
    }
}

fn to_sync(err: rusqlite::Error) -> SyncError {
    InfraError::from(err).into()
}
