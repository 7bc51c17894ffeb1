//! Sync run state and outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage of a single sync run.
///
/// `Idle → Authenticating → Fetching → Writing → Done`, with `Failed` as the
/// terminal state for any fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Idle,
    Authenticating,
    Fetching,
    Writing,
    Done,
    Failed,
}

impl SyncStage {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Authenticating)
                | (Self::Authenticating, Self::Fetching)
                | (Self::Fetching, Self::Writing)
                | (Self::Writing, Self::Done)
                | (Self::Idle | Self::Authenticating | Self::Fetching | Self::Writing, Self::Failed)
        )
    }
}

/// A row whose write failed while the run continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub external_id: String,
    pub message: String,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub mailbox: String,
    pub fetched: usize,
    pub written: usize,
    /// Records dropped because a required field was missing.
    pub skipped: usize,
    pub failed: Vec<RowFailure>,
    pub stage: SyncStage,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
            fetched: 0,
            written: 0,
            skipped: 0,
            failed: Vec::new(),
            stage: SyncStage::Idle,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// True when every fetched record was written.
    pub fn is_clean(&self) -> bool {
        self.stage == SyncStage::Done && self.failed.is_empty() && self.skipped == 0
    }

    pub fn has_row_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
