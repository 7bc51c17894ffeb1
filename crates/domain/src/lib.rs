//! # OutlookSync Domain
//!
//! Business domain types and models for OutlookSync.
//!
//! This crate contains:
//! - Calendar event types (remote record, validated event, persisted row)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Wire and schema constants
//!
//! ## Architecture
//! - No dependencies on other OutlookSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
