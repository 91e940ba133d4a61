use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Error taxonomy of the store. Every variant maps to a distinct status at the
/// HTTP boundary; `Sqlite` and `LockPoisoned` are the only uncategorized ones.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    InvalidOperation(&'static str),

    /// A uniqueness violation that reached the store. Safe to retry.
    #[error("conflicting concurrent write: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl DbError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi_err, msg) = &err {
            match (ffi_err.code, ffi_err.extended_code) {
                (
                    ErrorCode::ConstraintViolation,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
                ) => {
                    return DbError::Conflict(
                        msg.clone().unwrap_or_else(|| "unique constraint".into()),
                    );
                }
                // Target users and posts are checked inside each transaction,
                // so a dangling reference can only be the acting user.
                (ErrorCode::ConstraintViolation, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                    return DbError::NotFound("user");
                }
                _ => {}
            }
        }
        DbError::Sqlite(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k INTEGER NOT NULL UNIQUE); INSERT INTO t VALUES (1);")
            .unwrap();

        let err: DbError = conn.execute("INSERT INTO t VALUES (1)", []).unwrap_err().into();
        assert!(matches!(err, DbError::Conflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn foreign_key_violation_names_the_user() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE users (id INTEGER PRIMARY KEY);
             CREATE TABLE follows (follower_id INTEGER NOT NULL REFERENCES users(id));",
        )
        .unwrap();

        let err: DbError = conn
            .execute("INSERT INTO follows VALUES (7)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::NotFound("user")));
        assert_eq!(err.to_string(), "user not found");
    }

    #[test]
    fn other_failures_stay_uncategorized() {
        let conn = Connection::open_in_memory().unwrap();
        let err: DbError = conn.execute("SELECT * FROM missing", []).unwrap_err().into();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert!(!err.is_retryable());
    }
}
