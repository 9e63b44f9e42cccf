//! Error types for the liftlog_core library.

use rusqlite::ErrorCode;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced workout or exercise does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Referential or shape violation reported by the store
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Any other store failure (busy, locked, I/O inside SQLite, ...)
    #[error("Store error: {0}")]
    Store(rusqlite::Error),

    /// Request body failed validation before reaching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Exercise no longer qualifies for progression
    #[error("Exercise {0} is not eligible for progression")]
    NotEligible(i64),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| e.to_string()),
                )
            }
            other => Error::Store(other),
        }
    }
}

impl Error {
    /// True for the variants the HTTP layer reports as a client mistake
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_constraint_failure_is_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (n INTEGER NOT NULL CHECK (n >= 0));")
            .unwrap();

        let err: Error = conn
            .execute("INSERT INTO t (n) VALUES (-1)", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_other_sqlite_errors_are_store_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: Error = conn
            .execute("SELECT * FROM missing_table", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::Store(_)));
        assert!(!err.is_client_error());
    }
}
