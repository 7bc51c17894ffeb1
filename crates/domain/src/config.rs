//! Configuration management

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{AUTHORITY_BASE, GRAPH_API_BASE};

/// Application configuration for one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub graph: GraphConfig,
    pub store: StoreConfig,
    /// Mailbox (user id or UPN) whose default calendar is synchronised.
    pub mailbox: String,
}

/// How the process obtains a Graph token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Client-credentials grant, no signed-in user.
    #[default]
    AppOnly,
    /// Interactive device-code grant on behalf of a user.
    DeviceCode,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AppOnly => "app",
            Self::DeviceCode => "device",
        }
    }
}

/// Microsoft Graph connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub credentials: GraphCredentials,
    /// Graph API root, e.g. `https://graph.microsoft.com/v1.0`.
    pub api_base_url: String,
    /// Identity provider root, e.g. `https://login.microsoftonline.com`.
    pub authority_url: String,
}

impl GraphConfig {
    /// Settings pointing at the public Microsoft cloud.
    pub fn new(credentials: GraphCredentials) -> Self {
        Self {
            credentials,
            api_base_url: GRAPH_API_BASE.to_string(),
            authority_url: AUTHORITY_BASE.to_string(),
        }
    }

    pub fn auth_mode(&self) -> AuthMode {
        match self.credentials {
            GraphCredentials::ClientSecret { .. } => AuthMode::AppOnly,
            GraphCredentials::DeviceCode { .. } => AuthMode::DeviceCode,
        }
    }
}

/// Credential material for the selected [`AuthMode`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GraphCredentials {
    ClientSecret {
        tenant_id: String,
        client_id: String,
        #[serde(skip_serializing, default)]
        client_secret: String,
    },
    DeviceCode {
        tenant_id: String,
        client_id: String,
        scopes: Vec<String>,
    },
}

impl GraphCredentials {
    pub fn tenant_id(&self) -> &str {
        match self {
            Self::ClientSecret { tenant_id, .. } | Self::DeviceCode { tenant_id, .. } => tenant_id,
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            Self::ClientSecret { client_id, .. } | Self::DeviceCode { client_id, .. } => client_id,
        }
    }
}

impl fmt::Debug for GraphCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientSecret { tenant_id, client_id, .. } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Self::DeviceCode { tenant_id, client_id, scopes } => f
                .debug_struct("DeviceCode")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("scopes", scopes)
                .finish(),
        }
    }
}

/// Which relational store receives the rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    Postgres(PostgresConfig),
    Sqlite { path: PathBuf },
}

impl StoreConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Sqlite { .. } => "sqlite",
        }
    }
}

/// PostgreSQL connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub dbname: String,
    pub ssl_mode: SslMode,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Transport security for the Postgres connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslMode {
    #[default]
    Disable,
    Require,
}
