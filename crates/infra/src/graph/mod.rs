//! Microsoft Graph calendar and directory queries.

mod client;
mod models;

pub use client::GraphClient;
