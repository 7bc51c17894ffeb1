//! Shared HTTP plumbing for the identity provider and Graph clients.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
