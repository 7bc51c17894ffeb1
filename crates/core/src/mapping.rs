//! Field mapping between the remote event record and the `outlook_event` row.

use outlooksync_domain::constants::DEFAULT_SHOW_AS;
use outlooksync_domain::{CalendarEvent, EventRow, RawCalendarEvent, Result, SyncError};

/// Validate a remote record.
///
/// `id`, `subject`, `start` and `end` must be present; a blank id or
/// timestamp counts as missing. `body`, `change_key` and the organizer name
/// fall back to the empty string. Values are copied unchanged.
///
/// # Errors
/// Returns [`SyncError::RemoteQuery`] naming the first missing field.
pub fn to_calendar_event(raw: RawCalendarEvent) -> Result<CalendarEvent> {
    let external_id = non_blank(raw.id, "iCalUId", None)?;
    let hint = Some(external_id.as_str());

    let subject = raw.subject.ok_or_else(|| missing("subject", hint))?;
    let start_time = non_blank(raw.start, "start", hint)?;
    let end_time = non_blank(raw.end, "end", hint)?;

    Ok(CalendarEvent {
        subject,
        start_time,
        end_time,
        body: raw.body.unwrap_or_default(),
        change_key: raw.change_key.unwrap_or_default(),
        organizer_name: raw.organizer_name.unwrap_or_default(),
        show_as: raw.show_as,
        external_id,
    })
}

/// Shape a validated event into a row. `show_as` is always
/// [`DEFAULT_SHOW_AS`], whatever availability the source reported.
pub fn to_event_row(event: &CalendarEvent) -> EventRow {
    EventRow {
        external_id: event.external_id.clone(),
        subject: event.subject.clone(),
        body: event.body.clone(),
        change_key: event.change_key.clone(),
        organizer: event.organizer_name.clone(),
        start_time: event.start_time.clone(),
        end_time: event.end_time.clone(),
        show_as: DEFAULT_SHOW_AS.to_string(),
    }
}

/// [`to_calendar_event`] followed by [`to_event_row`].
///
/// # Errors
/// See [`to_calendar_event`].
pub fn map_record(raw: RawCalendarEvent) -> Result<EventRow> {
    to_calendar_event(raw).map(|event| to_event_row(&event))
}

fn non_blank(value: Option<String>, field: &str, id: Option<&str>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field, id)),
    }
}

fn missing(field: &str, id: Option<&str>) -> SyncError {
    match id {
        Some(id) => SyncError::RemoteQuery(format!("event {id} is missing required field `{field}`")),
        None => SyncError::RemoteQuery(format!("event record is missing required field `{field}`")),
    }
}
