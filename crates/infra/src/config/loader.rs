//! Configuration loader
//!
//! Builds a [`Config`] from environment variables. Every problem is collected
//! first and reported in a single `SyncError::Config`, so an operator fixing a
//! `.env` file sees the whole list at once.
//!
//! ## Environment Variables
//! - `CLIENT_ID`: app registration id (always required)
//! - `TENANT_ID`, `CLIENT_SECRET`: app-only credentials
//! - `AUTH_TENANT` (falls back to `TENANT_ID`), `GRAPH_USER_SCOPES`:
//!   device-code credentials, scopes comma separated
//! - `USER_ID`: mailbox to synchronise (unless given on the command line)
//! - `OUTLOOKSYNC_STORE`: `postgres` (default) or `sqlite`
//! - `A2DAM_HOST`, `A2DAM_PORT` (default 5432), `A2DAM_USER`,
//!   `A2DAM_PASSWORD`, `A2DAM_DBNAME`, `A2DAM_SSLMODE` (`disable`/`require`)
//! - `OUTLOOKSYNC_SQLITE_PATH`: database file for the sqlite store
//! - `OUTLOOKSYNC_GRAPH_URL`, `OUTLOOKSYNC_AUTHORITY_URL`: endpoint overrides

use std::path::PathBuf;

use outlooksync_domain::constants::DEFAULT_POSTGRES_PORT;
use outlooksync_domain::{
    AuthMode, Config, GraphConfig, GraphCredentials, PostgresConfig, Result, SslMode, StoreConfig,
    SyncError,
};
use url::Url;

/// Inputs that come from the command line rather than the environment.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub auth_mode: AuthMode,
    /// Overrides `USER_ID` when set.
    pub mailbox: Option<String>,
}

/// Load configuration from the process environment.
///
/// # Errors
/// Returns `SyncError::Config` listing every missing or invalid variable.
pub fn load_from_env(options: &LoadOptions) -> Result<Config> {
    load_with(|key| std::env::var(key).ok(), options)
}

/// Load configuration through an arbitrary variable lookup.
///
/// # Errors
/// Returns `SyncError::Config` listing every missing or invalid variable.
pub fn load_with<F>(lookup: F, options: &LoadOptions) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = EnvReader::new(lookup);

    let client_id = env.required("CLIENT_ID");
    let credentials = match options.auth_mode {
        AuthMode::AppOnly => GraphCredentials::ClientSecret {
            tenant_id: env.required("TENANT_ID"),
            client_id,
            client_secret: env.required("CLIENT_SECRET"),
        },
        AuthMode::DeviceCode => {
            let tenant_id = match env.optional("AUTH_TENANT") {
                Some(tenant) => tenant,
                None => env.required_as("TENANT_ID", "AUTH_TENANT"),
            };
            let scopes = parse_scopes(&env.required("GRAPH_USER_SCOPES"));
            if scopes.is_empty() && env.is_set("GRAPH_USER_SCOPES") {
                env.invalid("GRAPH_USER_SCOPES", "no scope listed");
            }
            GraphCredentials::DeviceCode { tenant_id, client_id, scopes }
        }
    };

    let mut graph = GraphConfig::new(credentials);
    if let Some(url) = env.url("OUTLOOKSYNC_GRAPH_URL") {
        graph.api_base_url = url;
    }
    if let Some(url) = env.url("OUTLOOKSYNC_AUTHORITY_URL") {
        graph.authority_url = url;
    }

    let mailbox = match &options.mailbox {
        Some(mailbox) if !mailbox.trim().is_empty() => mailbox.trim().to_string(),
        _ => env.required("USER_ID"),
    };

    let store = store_config(&mut env);
    env.finish()?;

    tracing::debug!(
        auth_mode = options.auth_mode.as_str(),
        store = store.backend_name(),
        "configuration loaded from environment"
    );

    Ok(Config { graph, store, mailbox })
}

/// Load only the store settings from the process environment.
///
/// # Errors
/// Returns `SyncError::Config` listing every missing or invalid variable.
pub fn load_store_from_env() -> Result<StoreConfig> {
    load_store_with(|key| std::env::var(key).ok())
}

/// Load only the store settings through an arbitrary variable lookup.
///
/// # Errors
/// Returns `SyncError::Config` listing every missing or invalid variable.
pub fn load_store_with<F>(lookup: F) -> Result<StoreConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = EnvReader::new(lookup);
    let store = store_config(&mut env);
    env.finish()?;
    Ok(store)
}

fn store_config<F>(env: &mut EnvReader<F>) -> StoreConfig
where
    F: Fn(&str) -> Option<String>,
{
    match env.optional("OUTLOOKSYNC_STORE").as_deref() {
        None | Some("postgres") => StoreConfig::Postgres(postgres_config(env)),
        Some("sqlite") => {
            StoreConfig::Sqlite { path: PathBuf::from(env.required("OUTLOOKSYNC_SQLITE_PATH")) }
        }
        Some(other) => {
            env.invalid("OUTLOOKSYNC_STORE", &format!("`{other}` is not postgres or sqlite"));
            StoreConfig::Postgres(postgres_config(env))
        }
    }
}

fn postgres_config<F>(env: &mut EnvReader<F>) -> PostgresConfig
where
    F: Fn(&str) -> Option<String>,
{
    let port = match env.optional("A2DAM_PORT") {
        None => DEFAULT_POSTGRES_PORT,
        Some(raw) => raw.parse::<u16>().unwrap_or_else(|e| {
            env.invalid("A2DAM_PORT", &format!("`{raw}`: {e}"));
            DEFAULT_POSTGRES_PORT
        }),
    };

    let ssl_mode = match env.optional("A2DAM_SSLMODE").as_deref() {
        None | Some("disable") => SslMode::Disable,
        Some("require") => SslMode::Require,
        Some(other) => {
            env.invalid("A2DAM_SSLMODE", &format!("`{other}` is not disable or require"));
            SslMode::Disable
        }
    };

    PostgresConfig {
        host: env.required("A2DAM_HOST"),
        port,
        user: env.required("A2DAM_USER"),
        password: env.required("A2DAM_PASSWORD"),
        dbname: env.required("A2DAM_DBNAME"),
        ssl_mode,
    }
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

/// Accumulates lookups so that all problems are reported together.
struct EnvReader<F> {
    lookup: F,
    missing: Vec<String>,
    invalid: Vec<String>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self { lookup, missing: Vec::new(), invalid: Vec::new() }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn is_set(&self, key: &str) -> bool {
        self.optional(key).is_some()
    }

    fn required(&mut self, key: &str) -> String {
        self.required_as(key, key)
    }

    /// Look up `key`, reporting `reported` as missing when absent.
    fn required_as(&mut self, key: &str, reported: &str) -> String {
        self.optional(key).unwrap_or_else(|| {
            self.missing.push(reported.to_string());
            String::new()
        })
    }

    fn url(&mut self, key: &str) -> Option<String> {
        let raw = self.optional(key)?;
        match Url::parse(&raw) {
            Ok(_) => Some(raw.trim_end_matches('/').to_string()),
            Err(e) => {
                self.invalid(key, &format!("`{raw}`: {e}"));
                None
            }
        }
    }

    fn invalid(&mut self, key: &str, reason: &str) {
        self.invalid.push(format!("{key} ({reason})"));
    }

    fn finish(self) -> Result<()> {
        let mut problems = Vec::new();
        if !self.missing.is_empty() {
            problems.push(format!(
                "missing required environment variables: {}",
                self.missing.join(", ")
            ));
        }
        if !self.invalid.is_empty() {
            problems.push(format!("invalid values: {}", self.invalid.join(", ")));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Config(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    fn app_only_env() -> HashMap<String, String> {
        env(&[
            ("CLIENT_ID", "client-123"),
            ("TENANT_ID", "tenant-abc"),
            ("CLIENT_SECRET", "s3cret"),
            ("USER_ID", "someone@example.com"),
            ("A2DAM_HOST", "db.internal"),
            ("A2DAM_USER", "sync"),
            ("A2DAM_PASSWORD", "pw"),
            ("A2DAM_DBNAME", "a2dam"),
        ])
    }

    fn load(vars: &HashMap<String, String>, options: &LoadOptions) -> Result<Config> {
        load_with(|key| vars.get(key).cloned(), options)
    }

    #[test]
    fn loads_app_only_postgres_config() {
        let config = load(&app_only_env(), &LoadOptions::default()).unwrap();

        assert_eq!(config.mailbox, "someone@example.com");
        assert_eq!(config.graph.credentials.tenant_id(), "tenant-abc");
        assert_eq!(config.graph.credentials.client_id(), "client-123");
        match config.store {
            StoreConfig::Postgres(pg) => {
                assert_eq!(pg.host, "db.internal");
                assert_eq!(pg.port, 5432);
                assert_eq!(pg.ssl_mode, SslMode::Disable);
            }
            other => panic!("expected postgres store, got {other:?}"),
        }
    }

    #[test]
    fn reports_all_missing_variables_together() {
        let err = load(&env(&[("CLIENT_ID", "c")]), &LoadOptions::default()).unwrap_err();

        let SyncError::Config(message) = err else { panic!("expected config error") };
        for key in [
            "TENANT_ID",
            "CLIENT_SECRET",
            "USER_ID",
            "A2DAM_HOST",
            "A2DAM_USER",
            "A2DAM_PASSWORD",
            "A2DAM_DBNAME",
        ] {
            assert!(message.contains(key), "{key} not reported in: {message}");
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut vars = app_only_env();
        vars.insert("CLIENT_SECRET".into(), "   ".into());

        let err = load(&vars, &LoadOptions::default()).unwrap_err();
        assert!(err.message().contains("CLIENT_SECRET"));
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let mut vars = app_only_env();
        vars.insert("A2DAM_PORT".into(), "fifty".into());

        let err = load(&vars, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.stage(), "config");
        assert!(err.message().contains("A2DAM_PORT"));
    }

    #[test]
    fn device_code_prefers_auth_tenant() {
        let vars = env(&[
            ("CLIENT_ID", "client"),
            ("AUTH_TENANT", "common"),
            ("TENANT_ID", "ignored"),
            ("GRAPH_USER_SCOPES", "User.Read, Calendars.Read,,"),
            ("USER_ID", "me@example.com"),
            ("OUTLOOKSYNC_STORE", "sqlite"),
            ("OUTLOOKSYNC_SQLITE_PATH", "/tmp/events.db"),
        ]);
        let options = LoadOptions { auth_mode: AuthMode::DeviceCode, mailbox: None };

        let config = load(&vars, &options).unwrap();

        match &config.graph.credentials {
            GraphCredentials::DeviceCode { tenant_id, scopes, .. } => {
                assert_eq!(tenant_id, "common");
                assert_eq!(scopes, &["User.Read", "Calendars.Read"]);
            }
            other => panic!("expected device code credentials, got {other:?}"),
        }
        assert!(matches!(config.store, StoreConfig::Sqlite { .. }));
    }

    #[test]
    fn device_code_falls_back_to_tenant_id() {
        let vars = env(&[
            ("CLIENT_ID", "client"),
            ("TENANT_ID", "tenant-abc"),
            ("GRAPH_USER_SCOPES", "Calendars.Read"),
            ("USER_ID", "me@example.com"),
            ("OUTLOOKSYNC_STORE", "sqlite"),
            ("OUTLOOKSYNC_SQLITE_PATH", "events.db"),
        ]);
        let options = LoadOptions { auth_mode: AuthMode::DeviceCode, mailbox: None };

        let config = load(&vars, &options).unwrap();
        assert_eq!(config.graph.credentials.tenant_id(), "tenant-abc");
    }

    #[test]
    fn mailbox_option_replaces_user_id() {
        let mut vars = app_only_env();
        vars.remove("USER_ID");
        let options =
            LoadOptions { auth_mode: AuthMode::AppOnly, mailbox: Some("room@example.com".into()) };

        let config = load(&vars, &options).unwrap();
        assert_eq!(config.mailbox, "room@example.com");
    }

    #[test]
    fn unknown_store_and_bad_url_are_reported() {
        let mut vars = app_only_env();
        vars.insert("OUTLOOKSYNC_STORE".into(), "mongo".into());
        vars.insert("OUTLOOKSYNC_GRAPH_URL".into(), "not a url".into());

        let message = load(&vars, &LoadOptions::default()).unwrap_err().message().to_string();
        assert!(message.contains("OUTLOOKSYNC_STORE"));
        assert!(message.contains("OUTLOOKSYNC_GRAPH_URL"));
    }

    #[test]
    fn store_settings_load_without_graph_credentials() {
        let vars = env(&[
            ("OUTLOOKSYNC_STORE", "postgres"),
            ("A2DAM_HOST", "db"),
            ("A2DAM_PORT", "6543"),
            ("A2DAM_USER", "sync"),
            ("A2DAM_PASSWORD", "pw"),
            ("A2DAM_DBNAME", "a2dam"),
            ("A2DAM_SSLMODE", "require"),
        ]);

        let store = load_store_with(|key| vars.get(key).cloned()).unwrap();

        match store {
            StoreConfig::Postgres(pg) => {
                assert_eq!(pg.port, 6543);
                assert_eq!(pg.ssl_mode, SslMode::Require);
            }
            other => panic!("expected postgres store, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_overrides_drop_trailing_slash() {
        let mut vars = app_only_env();
        vars.insert("OUTLOOKSYNC_GRAPH_URL".into(), "http://127.0.0.1:8080/v1.0/".into());

        let config = load(&vars, &LoadOptions::default()).unwrap();
        assert_eq!(config.graph.api_base_url, "http://127.0.0.1:8080/v1.0");
    }
}
