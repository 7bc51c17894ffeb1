//! Relational event stores
//!
//! PostgreSQL is the production store, SQLite a local alternative with the
//! same table and upsert semantics.

mod postgres;
pub mod schema;
mod sqlite;

use std::sync::Arc;

use outlooksync_core::StoreConnector;
use outlooksync_domain::StoreConfig;

pub use postgres::{PostgresConnector, PostgresEventStore};
pub use sqlite::{SqliteConnector, SqliteEventStore};

/// Build the connector for the configured backend.
pub fn connector_for(config: &StoreConfig) -> Arc<dyn StoreConnector> {
    match config {
        StoreConfig::Postgres(pg) => Arc::new(PostgresConnector::new(pg.clone())),
        StoreConfig::Sqlite { path } => Arc::new(SqliteConnector::new(path.clone())),
    }
}
