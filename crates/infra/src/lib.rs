//! # OutlookSync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Environment configuration loading
//! - Identity provider grants and the cached Graph session
//! - The Microsoft Graph client (events, calendars, users)
//! - PostgreSQL and SQLite event stores
//!
//! ## Architecture
//! - Implements traits defined in `outlooksync-core`
//! - Contains all "impure" code (HTTP, database, environment)

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod graph;
pub mod http;

// Re-export commonly used items
pub use auth::{credential_for, DevicePrompt, GraphSession};
pub use config::{load_from_env, load_store_from_env, load_store_with, load_with, LoadOptions};
pub use database::{connector_for, PostgresConnector, SqliteConnector, SqliteEventStore};
pub use errors::InfraError;
pub use graph::GraphClient;
pub use http::HttpClient;
