//! # OutlookSync Core
//!
//! Pure synchronisation logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the token provider, the remote
//!   event source and the relational store
//! - Field mapping from remote records to persisted rows
//! - The sync service driving a single run
//!
//! ## Architecture Principles
//! - Only depends on `outlooksync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod mapping;
pub mod ports;
pub mod sync;

pub use mapping::{map_record, to_calendar_event, to_event_row};
pub use ports::{EventSource, EventStore, StoreConnector, TokenProvider};
pub use sync::{init_store, SyncService, WriteFailurePolicy};
