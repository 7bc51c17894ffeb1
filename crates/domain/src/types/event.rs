//! Calendar event shapes, from the wire record to the persisted row.

use serde::{Deserialize, Serialize};

/// Event record as returned by the calendar API (before validation).
///
/// Every field is optional because the API omits properties freely; the
/// mapping layer decides which ones are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCalendarEvent {
    /// iCalendar UID, stable across calendars and mailboxes.
    pub id: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub body_preview: Option<String>,
    pub categories: Vec<String>,
    pub change_key: Option<String>,
    pub organizer_name: Option<String>,
    pub organizer_address: Option<String>,
    pub attendees: Vec<String>,
    pub start: Option<String>,
    pub start_time_zone: Option<String>,
    pub end: Option<String>,
    pub end_time_zone: Option<String>,
    pub location: Option<String>,
    pub is_all_day: Option<bool>,
    pub show_as: Option<String>,
}

/// Validated calendar event, fetched fresh each run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub external_id: String,
    pub subject: String,
    pub body: String,
    pub change_key: String,
    pub organizer_name: String,
    /// Timestamp exactly as returned by the source (no timezone handling).
    pub start_time: String,
    pub end_time: String,
    /// Source availability, kept for logging only.
    pub show_as: Option<String>,
}

/// Row of the `outlook_event` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub external_id: String,
    pub subject: String,
    pub body: String,
    pub change_key: String,
    pub organizer: String,
    pub start_time: String,
    pub end_time: String,
    pub show_as: String,
}
