//! Application constants
//!
//! Centralized location for the wire and schema constants shared between the
//! Graph client, the stores and the mapping layer.

// Microsoft Graph endpoints
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const AUTHORITY_BASE: &str = "https://login.microsoftonline.com";
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Fields requested for every event query.
pub const EVENT_SELECT_FIELDS: &[&str] = &[
    "iCalUId",
    "subject",
    "body",
    "bodyPreview",
    "categories",
    "changeKey",
    "organizer",
    "attendees",
    "start",
    "end",
    "location",
    "isAllDay",
    "showAs",
];

pub const CALENDAR_SELECT_FIELDS: &[&str] = &["name", "owner"];
pub const USER_SELECT_FIELDS: &[&str] = &["displayName", "id", "mail"];
pub const USER_LIST_TOP: u32 = 25;
pub const ME_SELECT_FIELDS: &[&str] = &["displayName", "mail", "userPrincipalName"];

/// `Prefer` header asking Graph to render event bodies as plain text.
pub const PREFER_TEXT_BODY: &str = r#"outlook.body-content-type="text""#;

// Storage
pub const EVENT_TABLE: &str = "outlook_event";

/// Value written to `show_as` for every row, whatever the source says.
pub const DEFAULT_SHOW_AS: &str = "default";

pub const DEFAULT_POSTGRES_PORT: u16 = 5432;

// Exit codes used by the binary
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FATAL: u8 = 1;
pub const EXIT_PARTIAL: u8 = 2;
