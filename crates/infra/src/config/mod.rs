//! Configuration loading and management
//!
//! This module provides utilities for loading application configuration
//! from environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{load_from_env, load_store_from_env, load_store_with, load_with, LoadOptions};
