//! Single-mailbox sync run
//!
//! Authenticates, fetches the full event collection, then maps and upserts
//! each record in order. One store connection is held for the write stage and
//! released on every exit path.

use std::sync::Arc;

use chrono::Utc;
use outlooksync_domain::{
    CalendarSummary, DirectoryUser, RawCalendarEvent, Result, RowFailure, SignedInUser, SyncError,
    SyncReport, SyncStage,
};
use tracing::{debug, error, info, instrument, warn};

use crate::mapping::map_record;
use crate::ports::{EventSource, EventStore, StoreConnector, TokenProvider};

/// What to do when a single row cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Log the failure, record it in the report and keep going.
    #[default]
    Continue,
    /// Abort the run with the first write error.
    Abort,
}

/// Drives one sync run against injected ports.
pub struct SyncService {
    tokens: Arc<dyn TokenProvider>,
    source: Arc<dyn EventSource>,
    connector: Arc<dyn StoreConnector>,
    policy: WriteFailurePolicy,
}

impl SyncService {
    /// Create a new sync service instance
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        source: Arc<dyn EventSource>,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        Self { tokens, source, connector, policy: WriteFailurePolicy::default() }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Synchronise every event of `mailbox` into the store.
    ///
    /// # Errors
    /// - [`SyncError::Auth`] when the credential cannot be established
    /// - [`SyncError::RemoteQuery`] when the event query fails
    /// - [`SyncError::Write`] when the store cannot be opened, or on the first
    ///   failing row under [`WriteFailurePolicy::Abort`]
    #[instrument(skip(self), fields(policy = ?self.policy))]
    pub async fn run(&self, mailbox: &str) -> Result<SyncReport> {
        let mut report = SyncReport::new(mailbox);
        info!(mailbox, "starting calendar sync");

        advance(&mut report, SyncStage::Authenticating);
        if let Err(err) = self.tokens.authenticate().await {
            return Err(fail(&mut report, err));
        }

        advance(&mut report, SyncStage::Fetching);
        let records = match self.source.fetch_events(mailbox).await {
            Ok(records) => records,
            Err(err) => return Err(fail(&mut report, err)),
        };
        report.fetched = records.len();
        debug!(mailbox, fetched = report.fetched, "fetched event collection");

        advance(&mut report, SyncStage::Writing);
        let mut store = match self.connector.connect().await {
            Ok(store) => store,
            Err(err) => return Err(fail(&mut report, err)),
        };

        let outcome = self.write_all(store.as_mut(), records, &mut report).await;

        if let Err(err) = store.close().await {
            warn!(mailbox, error = %err, "failed to close store connection");
        }

        if let Err(err) = outcome {
            return Err(fail(&mut report, err));
        }

        advance(&mut report, SyncStage::Done);
        report.finished_at = Some(Utc::now());

        info!(
            mailbox,
            fetched = report.fetched,
            written = report.written,
            skipped = report.skipped,
            failed = report.failed.len(),
            "calendar sync completed"
        );

        Ok(report)
    }

    /// Authenticate, then list the calendars of `mailbox`.
    ///
    /// # Errors
    /// Propagates authentication and query failures.
    pub async fn calendars(&self, mailbox: &str) -> Result<Vec<CalendarSummary>> {
        self.tokens.authenticate().await?;
        self.source.list_calendars(mailbox).await
    }

    /// Authenticate, then list directory users.
    ///
    /// # Errors
    /// Propagates authentication and query failures.
    pub async fn users(&self) -> Result<Vec<DirectoryUser>> {
        self.tokens.authenticate().await?;
        self.source.list_users().await
    }

    /// Authenticate, then read the signed-in user's profile.
    ///
    /// # Errors
    /// Propagates authentication and query failures.
    pub async fn current_user(&self) -> Result<SignedInUser> {
        self.tokens.authenticate().await?;
        self.source.current_user().await
    }

    async fn write_all(
        &self,
        store: &mut dyn EventStore,
        records: Vec<RawCalendarEvent>,
        report: &mut SyncReport,
    ) -> Result<()> {
        for (index, raw) in records.into_iter().enumerate() {
            let row = match map_record(raw) {
                Ok(row) => row,
                Err(err) => {
                    warn!(index, error = %err, "skipping malformed event record");
                    report.skipped += 1;
                    continue;
                }
            };

            match store.upsert(&row).await {
                Ok(()) => {
                    report.written += 1;
                    debug!(external_id = %row.external_id, subject = %row.subject, "event upserted");
                }
                Err(err) if self.policy == WriteFailurePolicy::Abort => return Err(err),
                Err(err) => {
                    warn!(external_id = %row.external_id, error = %err, "event write failed, continuing");
                    report.failed.push(RowFailure {
                        external_id: row.external_id,
                        message: err.message().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Open a store connection, create the event table if missing, and close it.
///
/// # Errors
/// Returns [`SyncError::Write`] if the store is unreachable or the DDL fails.
#[instrument(skip_all)]
pub async fn init_store(connector: &dyn StoreConnector) -> Result<()> {
    let mut store = connector.connect().await?;
    let outcome = store.ensure_schema().await;

    if let Err(err) = store.close().await {
        warn!(error = %err, "failed to close store connection");
    }

    outcome?;
    info!("event table ready");
    Ok(())
}

fn advance(report: &mut SyncReport, next: SyncStage) {
    debug_assert!(
        report.stage.can_advance_to(next),
        "illegal sync transition {:?} -> {:?}",
        report.stage,
        next
    );
    debug!(from = ?report.stage, to = ?next, "sync stage transition");
    report.stage = next;
}

fn fail(report: &mut SyncReport, err: SyncError) -> SyncError {
    error!(
        mailbox = %report.mailbox,
        stage = err.stage(),
        during = ?report.stage,
        error = %err,
        "calendar sync failed"
    );
    advance(report, SyncStage::Failed);
    report.finished_at = Some(Utc::now());
    err
}
