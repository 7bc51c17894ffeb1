//! Domain types and models

pub mod directory;
pub mod event;
pub mod report;

pub use directory::{CalendarSummary, DirectoryUser, SignedInUser};
pub use event::{CalendarEvent, EventRow, RawCalendarEvent};
pub use report::{RowFailure, SyncReport, SyncStage};
