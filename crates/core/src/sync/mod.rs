//! Sync run orchestration

mod service;

pub use service::{init_store, SyncService, WriteFailurePolicy};
