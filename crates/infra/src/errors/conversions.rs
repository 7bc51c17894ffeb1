//! Conversions from external infrastructure errors into domain errors.

use outlooksync_domain::SyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tokio_postgres::error::SqlState;
use tokio_postgres::Error as PgError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSyncError {
    fn into_sync_error(self) -> SyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for SqlError {
    fn into_sync_error(self) -> SyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => SyncError::Write("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => SyncError::Write("database is locked".into()),
                    (ErrorCode::CannotOpen, _) => {
                        SyncError::Write(format!("unable to open database: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, _) => {
                        SyncError::Write(format!("constraint violation: {message}"))
                    }
                    _ => SyncError::Write(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::InvalidPath(path) => {
                SyncError::Write(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => SyncError::Write("invalid SQL query".into()),
            other => SyncError::Write(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_sync_error())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio_postgres::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for PgError {
    fn into_sync_error(self) -> SyncError {
        if self.is_closed() {
            return SyncError::Write("postgres connection closed".into());
        }

        match (self.code(), self.as_db_error()) {
            (Some(code), Some(db)) if *code == SqlState::UNIQUE_VIOLATION => {
                SyncError::Write(format!("unique constraint violation: {}", db.message()))
            }
            (Some(code), Some(db)) if *code == SqlState::UNDEFINED_TABLE => SyncError::Write(
                format!("{} (run `outlook-sync init-db` to create the table)", db.message()),
            ),
            (Some(code), Some(db))
                if *code == SqlState::INVALID_PASSWORD
                    || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION =>
            {
                SyncError::Write(format!("database login rejected: {}", db.message()))
            }
            (Some(code), Some(db)) => {
                SyncError::Write(format!("postgres error {}: {}", code.code(), db.message()))
            }
            _ => SyncError::Write(format!("postgres failure: {self}")),
        }
    }
}

impl From<PgError> for InfraError {
    fn from(value: PgError) -> Self {
        InfraError(value.into_sync_error())
    }
}

impl From<native_tls::Error> for InfraError {
    fn from(value: native_tls::Error) -> Self {
        InfraError(SyncError::Write(format!("TLS setup failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for HttpError {
    fn into_sync_error(self) -> SyncError {
        if self.is_timeout() {
            return SyncError::RemoteQuery("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SyncError::RemoteQuery(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SyncError::Auth(message),
                _ => SyncError::RemoteQuery(message),
            };
        }

        if self.is_decode() {
            return SyncError::RemoteQuery(format!("malformed response body: {self}"));
        }

        SyncError::RemoteQuery(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sync_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
