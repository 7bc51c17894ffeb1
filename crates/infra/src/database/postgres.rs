//! PostgreSQL event store
//!
//! One `tokio-postgres` connection per sync run. The connection future runs on
//! a spawned task that is joined on [`EventStore::close`] and aborted on drop.

use std::time::Duration;

use async_trait::async_trait;
use outlooksync_core::{EventStore, StoreConnector};
use outlooksync_domain::constants::EVENT_TABLE;
use outlooksync_domain::{EventRow, PostgresConfig, Result, SslMode, SyncError};
use postgres_native_tls::MakeTlsConnector;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode as PgSslMode;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, instrument, warn};

use super::schema::{CREATE_EVENT_TABLE, UPSERT_EVENT_POSTGRES};
use crate::errors::InfraError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens one [`PostgresEventStore`] per sync run.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    config: PostgresConfig,
}

impl PostgresConnector {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    fn connection_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.config.host)
            .port(self.config.port)
            .user(&self.config.user)
            .password(&self.config.password)
            .dbname(&self.config.dbname)
            .application_name("outlook-sync")
            .connect_timeout(CONNECT_TIMEOUT)
            .ssl_mode(match self.config.ssl_mode {
                SslMode::Disable => PgSslMode::Disable,
                SslMode::Require => PgSslMode::Require,
            });
        pg
    }
}

#[async_trait]
impl StoreConnector for PostgresConnector {
    #[instrument(skip(self), fields(host = %self.config.host, dbname = %self.config.dbname))]
    async fn connect(&self) -> Result<Box<dyn EventStore>> {
        let pg = self.connection_config();

        let (client, driver) = match self.config.ssl_mode {
            SslMode::Disable => {
                let (client, connection) = pg.connect(NoTls).await.map_err(to_sync)?;
                let driver = tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        warn!(error = %err, "postgres connection terminated with error");
                    }
                });
                (client, driver)
            }
            SslMode::Require => {
                let tls = native_tls::TlsConnector::builder()
                    .build()
                    .map_err(|e| SyncError::from(InfraError::from(e)))?;
                let (client, connection) =
                    pg.connect(MakeTlsConnector::new(tls)).await.map_err(to_sync)?;
                let driver = tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        warn!(error = %err, "postgres connection terminated with error");
                    }
                });
                (client, driver)
            }
        };

        debug!(port = self.config.port, ssl = ?self.config.ssl_mode, "postgres connection established");
        Ok(Box::new(PostgresEventStore { client: Some(client), driver: Some(driver) }))
    }
}

/// One open PostgreSQL connection.
pub struct PostgresEventStore {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
}

impl PostgresEventStore {
    fn client(&self) -> Result<&Client> {
        self.client.as_ref().ok_or_else(|| SyncError::Write("postgres connection closed".into()))
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn ensure_schema(&mut self) -> Result<()> {
        self.client()?.batch_execute(CREATE_EVENT_TABLE).await.map_err(to_sync)?;
        debug!(table = EVENT_TABLE, "schema ensured");
        Ok(())
    }

    async fn upsert(&mut self, row: &EventRow) -> Result<()> {
        self.client()?
            .execute(
                UPSERT_EVENT_POSTGRES,
                &[
                    &row.external_id,
                    &row.subject,
                    &row.body,
                    &row.change_key,
                    &row.organizer,
                    &row.start_time,
                    &row.end_time,
                    &row.show_as,
                ],
            )
            .await
            .map_err(to_sync)?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = self;
        // Dropping the client ends the connection future.
        drop(this.client.take());

        if let Some(driver) = this.driver.take() {
            driver.await.map_err(|e| {
                SyncError::Write(format!("postgres connection task failed: {e}"))
            })?;
        }
        debug!("postgres connection closed");
        Ok(())
    }
}

impl Drop for PostgresEventStore {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            debug!("postgres store dropped without close, aborting connection task");
            driver.abort();
        }
    }
}

fn to_sync(err: tokio_postgres::Error) -> SyncError {
    InfraError::from(err).into()
}
