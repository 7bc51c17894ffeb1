//! Graph client implementing the [`EventSource`] port.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use outlooksync_core::{EventSource, TokenProvider};
use outlooksync_domain::constants::{
    CALENDAR_SELECT_FIELDS, EVENT_SELECT_FIELDS, ME_SELECT_FIELDS, PREFER_TEXT_BODY,
    USER_LIST_TOP, USER_SELECT_FIELDS,
};
use outlooksync_domain::{
    CalendarSummary, DirectoryUser, RawCalendarEvent, Result, SignedInUser, SyncError,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::models::{GraphCalendar, GraphEvent, GraphMe, GraphUser, Page};
use crate::http::HttpClient;

/// Read-only Graph queries on behalf of one token provider.
pub struct GraphClient {
    http: HttpClient,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
}

impl GraphClient {
    pub fn new(http: HttpClient, tokens: Arc<dyn TokenProvider>, base_url: &str) -> Self {
        Self { http, tokens, base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// Build `{base}/{segments...}?{query}` with each segment percent-encoded.
    fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            SyncError::Config(format!("invalid Graph base URL `{}`: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                SyncError::Config(format!("Graph base URL `{}` cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &Url,
        prefer: Option<&str>,
    ) -> Result<Page<T>> {
        let token = self.tokens.access_token().await?;
        let mut request = self.http.get(url.as_str()).bearer_auth(token);
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        self.http.send_json(request).await
    }

    /// Follow `@odata.nextLink` until the collection is exhausted.
    ///
    /// A link back to any page already read is a remote error.
    async fn get_all<T: DeserializeOwned>(&self, first: Url, prefer: Option<&str>) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            let page: Page<T> = self.get_page(&url, prefer).await?;
            items.extend(page.value);
            visited.insert(url);

            if let Some(link) = page.next_link {
                let link = Url::parse(&link).map_err(|e| {
                    SyncError::RemoteQuery(format!("invalid @odata.nextLink: {e}"))
                })?;
                if visited.contains(&link) {
                    return Err(SyncError::RemoteQuery(format!(
                        "@odata.nextLink cycles back to page {} after {} pages",
                        link.path(),
                        visited.len()
                    )));
                }
                next = Some(link);
            }
        }

        debug!(pages = visited.len(), items = items.len(), "collection exhausted");
        Ok(items)
    }
}

#[async_trait]
impl EventSource for GraphClient {
    #[instrument(skip(self))]
    async fn fetch_events(&self, mailbox: &str) -> Result<Vec<RawCalendarEvent>> {
        let url = self.url(
            &["users", mailbox, "calendar", "events"],
            &[("$select", EVENT_SELECT_FIELDS.join(","))],
        )?;
        let events: Vec<GraphEvent> = self.get_all(url, Some(PREFER_TEXT_BODY)).await?;
        Ok(events.into_iter().map(RawCalendarEvent::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_calendars(&self, mailbox: &str) -> Result<Vec<CalendarSummary>> {
        let url = self.url(
            &["users", mailbox, "calendars"],
            &[("$select", CALENDAR_SELECT_FIELDS.join(","))],
        )?;
        let calendars: Vec<GraphCalendar> = self.get_all(url, None).await?;
        Ok(calendars.into_iter().map(CalendarSummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<DirectoryUser>> {
        let url = self.url(
            &["users"],
            &[
                ("$select", USER_SELECT_FIELDS.join(",")),
                ("$top", USER_LIST_TOP.to_string()),
                ("$orderby", "displayName".to_string()),
            ],
        )?;
        // First page only.
        let page: Page<GraphUser> = self.get_page(&url, None).await?;
        Ok(page.value.into_iter().map(DirectoryUser::from).collect())
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<SignedInUser> {
        let url = self.url(&["me"], &[("$select", ME_SELECT_FIELDS.join(","))])?;
        let token = self.tokens.access_token().await?;
        let me: GraphMe =
            self.http.send_json(self.http.get(url.as_str()).bearer_auth(token)).await?;
        Ok(SignedInUser::from(me))
    }
}
