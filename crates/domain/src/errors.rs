//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for OutlookSync.
///
/// Every variant corresponds to one stage of a sync run, so a failure can be
/// reported to the operator as "which stage broke" without inspecting the
/// message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncError {
    /// Missing or invalid process configuration, detected before any network
    /// call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential or token failure against the identity provider.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Calendar API failure, including records missing required fields.
    #[error("Remote query error: {0}")]
    RemoteQuery(String),

    /// Database connectivity or constraint failure.
    #[error("Write error: {0}")]
    Write(String),
}

impl SyncError {
    /// Stable label of the stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::RemoteQuery(_) => "fetch",
            Self::Write(_) => "write",
        }
    }

    /// The bare message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(message)
            | Self::Auth(message)
            | Self::RemoteQuery(message)
            | Self::Write(message) => message,
        }
    }
}

/// Result type alias for OutlookSync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_are_stable() {
        assert_eq!(SyncError::Config("x".into()).stage(), "config");
        assert_eq!(SyncError::Auth("x".into()).stage(), "auth");
        assert_eq!(SyncError::RemoteQuery("x".into()).stage(), "fetch");
        assert_eq!(SyncError::Write("x".into()).stage(), "write");
    }

    #[test]
    fn display_includes_category() {
        let err = SyncError::Write("connection refused".into());
        assert_eq!(err.to_string(), "Write error: connection refused");
        assert_eq!(err.message(), "connection refused");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(SyncError::Auth("expired".into())).unwrap();
        assert_eq!(json["type"], "Auth");
        assert_eq!(json["message"], "expired");
    }
}
