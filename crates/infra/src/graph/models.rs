//! Graph wire shapes and their conversion into domain records.

use outlooksync_domain::{CalendarSummary, DirectoryUser, RawCalendarEvent, SignedInUser};
use serde::Deserialize;

/// One page of a Graph collection.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphEvent {
    #[serde(rename = "iCalUId")]
    pub ical_uid: Option<String>,
    pub subject: Option<String>,
    pub body: Option<ItemBody>,
    pub body_preview: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub change_key: Option<String>,
    pub organizer: Option<Recipient>,
    #[serde(default)]
    pub attendees: Vec<Recipient>,
    pub start: Option<DateTimeTimeZone>,
    pub end: Option<DateTimeTimeZone>,
    pub location: Option<Location>,
    pub is_all_day: Option<bool>,
    pub show_as: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemBody {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Recipient {
    pub email_address: Option<EmailAddress>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DateTimeTimeZone {
    pub date_time: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Location {
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphCalendar {
    pub name: Option<String>,
    pub owner: Option<EmailAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphUser {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphMe {
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
}

impl From<GraphEvent> for RawCalendarEvent {
    fn from(event: GraphEvent) -> Self {
        let (organizer_name, organizer_address) = event
            .organizer
            .and_then(|r| r.email_address)
            .map_or((None, None), |e| (e.name, e.address));
        let (start, start_time_zone) = split_time(event.start);
        let (end, end_time_zone) = split_time(event.end);

        Self {
            id: event.ical_uid,
            subject: event.subject,
            body: event.body.and_then(|b| b.content),
            body_preview: event.body_preview,
            categories: event.categories,
            change_key: event.change_key,
            organizer_name,
            organizer_address,
            attendees: event
                .attendees
                .into_iter()
                .filter_map(|a| a.email_address)
                .filter_map(|e| e.address.or(e.name))
                .collect(),
            start,
            start_time_zone,
            end,
            end_time_zone,
            location: event.location.and_then(|l| l.display_name).filter(|l| !l.is_empty()),
            is_all_day: event.is_all_day,
            show_as: event.show_as,
        }
    }
}

fn split_time(value: Option<DateTimeTimeZone>) -> (Option<String>, Option<String>) {
    value.map_or((None, None), |v| (v.date_time, v.time_zone))
}

impl From<GraphCalendar> for CalendarSummary {
    fn from(calendar: GraphCalendar) -> Self {
        let (owner_name, owner_address) =
            calendar.owner.map_or((None, None), |o| (o.name, o.address));
        Self { name: calendar.name.unwrap_or_default(), owner_name, owner_address }
    }
}

impl From<GraphUser> for DirectoryUser {
    fn from(user: GraphUser) -> Self {
        Self { id: user.id, display_name: user.display_name, mail: user.mail }
    }
}

impl From<GraphMe> for SignedInUser {
    fn from(me: GraphMe) -> Self {
        Self {
            display_name: me.display_name,
            mail: me.mail,
            user_principal_name: me.user_principal_name,
        }
    }
}
