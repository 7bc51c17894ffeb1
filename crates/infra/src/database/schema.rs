//! DDL and upsert statements for the `outlook_event` table.
//!
//! Both backends share the same column layout. The upsert overwrites every
//! mutable column in a single statement; `change_key` is stored but never
//! compared.

/// Table definition, safe to run on every start.
pub const CREATE_EVENT_TABLE: &str = "CREATE TABLE IF NOT EXISTS outlook_event (
    id TEXT PRIMARY KEY,
    subject TEXT,
    body TEXT,
    change_key TEXT,
    organizer TEXT,
    start_time TEXT,
    end_time TEXT,
    show_as TEXT
)";

pub const UPSERT_EVENT_POSTGRES: &str = "INSERT INTO outlook_event
    (id, subject, body, change_key, organizer, start_time, end_time, show_as)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (id) DO UPDATE SET
        subject = excluded.subject,
        body = excluded.body,
        change_key = excluded.change_key,
        organizer = excluded.organizer,
        start_time = excluded.start_time,
        end_time = excluded.end_time,
        show_as = excluded.show_as";

pub const UPSERT_EVENT_SQLITE: &str = "INSERT INTO outlook_event
    (id, subject, body, change_key, organizer, start_time, end_time, show_as)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(id) DO UPDATE SET
        subject = excluded.subject,
        body = excluded.body,
        change_key = excluded.change_key,
        organizer = excluded.organizer,
        start_time = excluded.start_time,
        end_time = excluded.end_time,
        show_as = excluded.show_as";

pub const SELECT_EVENT_SQLITE: &str = "SELECT id, subject, body, change_key, organizer,
    start_time, end_time, show_as FROM outlook_event WHERE id = ?1";

pub const COUNT_EVENTS: &str = "SELECT COUNT(*) FROM outlook_event";
