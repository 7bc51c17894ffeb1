//! Subcommand handlers
//!
//! Each handler writes its human-readable result to `out` and returns the
//! process exit code. Fatal errors bubble up as [`SyncError`] inside
//! `anyhow::Error` so `main` can print the failed stage.

use std::io::Write;
use std::sync::Arc;

use outlooksync_core::{init_store, SyncService, WriteFailurePolicy};
use outlooksync_domain::constants::{EXIT_PARTIAL, EXIT_SUCCESS};
use outlooksync_domain::{
    AuthMode, CalendarSummary, Config, DirectoryUser, SignedInUser, StoreConfig, SyncError,
    SyncReport,
};
use outlooksync_infra::{
    connector_for, credential_for, DevicePrompt, GraphClient, GraphSession, HttpClient,
};
use tracing::info;

/// Services wired for one process.
pub struct App {
    service: SyncService,
    mailbox: String,
    auth_mode: AuthMode,
}

impl App {
    /// Wire the Graph session, client and store connector from `config`.
    ///
    /// Nothing is contacted until a command runs.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn build(config: &Config, policy: WriteFailurePolicy) -> Result<Self, SyncError> {
        let http = HttpClient::new()?;
        let prompt: DevicePrompt = Arc::new(|message: &str| eprintln!("{message}"));
        let credential = credential_for(&config.graph, prompt);
        let session = Arc::new(GraphSession::new(http.clone(), credential));
        let client = Arc::new(GraphClient::new(http, session.clone(), &config.graph.api_base_url));
        let connector = connector_for(&config.store);

        info!(
            mailbox = %config.mailbox,
            auth = config.graph.auth_mode().as_str(),
            store = config.store.backend_name(),
            "outlook-sync ready"
        );

        Ok(Self {
            service: SyncService::new(session, client, connector).with_policy(policy),
            mailbox: config.mailbox.clone(),
            auth_mode: config.graph.auth_mode(),
        })
    }

    pub async fn sync(&self, out: &mut impl Write) -> anyhow::Result<u8> {
        let report = self.service.run(&self.mailbox).await?;
        render_report(&report, out)?;
        Ok(if report.has_row_failures() { EXIT_PARTIAL } else { EXIT_SUCCESS })
    }

    pub async fn calendars(&self, out: &mut impl Write) -> anyhow::Result<u8> {
        let calendars = self.service.calendars(&self.mailbox).await?;
        render_calendars(&calendars, out)?;
        Ok(EXIT_SUCCESS)
    }

    pub async fn users(&self, out: &mut impl Write) -> anyhow::Result<u8> {
        let users = self.service.users().await?;
        render_users(&users, out)?;
        Ok(EXIT_SUCCESS)
    }

    /// App-only tokens have no signed-in user, so this is refused before any
    /// network call.
    pub async fn whoami(&self, out: &mut impl Write) -> anyhow::Result<u8> {
        if self.auth_mode != AuthMode::DeviceCode {
            return Err(SyncError::Config("whoami requires --auth device".into()).into());
        }
        let user = self.service.current_user().await?;
        render_user(&user, out)?;
        Ok(EXIT_SUCCESS)
    }
}

pub async fn init_db(store: &StoreConfig, out: &mut impl Write) -> anyhow::Result<u8> {
    let connector = connector_for(store);
    init_store(connector.as_ref()).await?;
    writeln!(out, "Table outlook_event is ready ({})", store.backend_name())?;
    Ok(EXIT_SUCCESS)
}

pub fn render_report(report: &SyncReport, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        out,
        "Synced {}: {} fetched, {} written, {} skipped, {} failed",
        report.mailbox,
        report.fetched,
        report.written,
        report.skipped,
        report.failed.len()
    )?;
    if report.is_clean() {
        return writeln!(out, "All events written.");
    }
    for failure in &report.failed {
        writeln!(out, "  failed {}: {}", failure.external_id, failure.message)?;
    }
    Ok(())
}

pub fn render_calendars(
    calendars: &[CalendarSummary],
    out: &mut impl Write,
) -> std::io::Result<()> {
    if calendars.is_empty() {
        return writeln!(out, "No calendars found.");
    }
    for calendar in calendars {
        writeln!(out, "Calendar: {}", calendar.name)?;
        match (&calendar.owner_name, &calendar.owner_address) {
            (Some(name), Some(address)) => writeln!(out, "  Owner: {name} <{address}>")?,
            (Some(name), None) => writeln!(out, "  Owner: {name}")?,
            (None, Some(address)) => writeln!(out, "  Owner: <{address}>")?,
            (None, None) => {}
        }
    }
    Ok(())
}

pub fn render_users(users: &[DirectoryUser], out: &mut impl Write) -> std::io::Result<()> {
    for user in users {
        writeln!(out, "User: {}", user.display_name.as_deref().unwrap_or("(no name)"))?;
        writeln!(out, "  ID: {}", user.id)?;
        writeln!(out, "  Email: {}", user.mail.as_deref().unwrap_or("NO EMAIL"))?;
    }
    Ok(())
}

pub fn render_user(user: &SignedInUser, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Hello, {}!", user.display_name.as_deref().unwrap_or("(no name)"))?;
    writeln!(out, "Email: {}", user.email().unwrap_or("NO EMAIL"))
}
