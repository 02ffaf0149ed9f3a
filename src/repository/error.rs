//! Error types for book persistence.

use std::fmt;

use thiserror::Error;

/// Structured classification for database failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// `SQLite` returned busy/locked.
    BusyOrLocked,
    /// Constraint failure (not-null/check).
    ConstraintViolation,
    /// Connection pool timed out waiting for a free connection.
    PoolTimeout,
    /// Connection pool is closed.
    PoolClosed,
    /// Filesystem or transport IO failure.
    Io,
    /// A column could not be decoded.
    Decode,
    Other,
}

impl DbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::Decode,
            sqlx::Error::Database(database_error) => {
                classify_database_error(database_error.as_ref())
            }
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::Io => "io",
            Self::Decode => "decode",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

fn classify_database_error(
    database_error: &(dyn sqlx::error::DatabaseError + 'static),
) -> DbErrorKind {
    let code = database_error.code();
    if matches!(
        code.as_deref(),
        Some("SQLITE_BUSY" | "SQLITE_LOCKED" | "5" | "6")
    ) {
        return DbErrorKind::BusyOrLocked;
    }

    if database_error.is_check_violation()
        || code
            .as_deref()
            .is_some_and(|value| value.starts_with("SQLITE_CONSTRAINT") || value.starts_with("19"))
    {
        return DbErrorKind::ConstraintViolation;
    }

    let message = database_error.message().to_ascii_lowercase();
    if message.contains("database is locked") || message.contains("database is busy") {
        return DbErrorKind::BusyOrLocked;
    }
    if message.contains("constraint failed") {
        return DbErrorKind::ConstraintViolation;
    }

    DbErrorKind::Other
}

/// Errors that can occur while persisting books.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        kind: DbErrorKind,
        message: String,
    },

    /// The payload cannot be stored.
    #[error("invalid book '{field}': {reason}\n  Suggestion: Send a book with a title and an isbn")]
    InvalidBook { field: &'static str, reason: String },

    /// A stored row cannot be turned back into a book.
    #[error("stored book {id} is unreadable: {reason}")]
    CorruptRow { id: i64, reason: String },
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: DbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl RepositoryError {
    #[must_use]
    pub fn invalid_book(field: &'static str, reason: &str) -> Self {
        Self::InvalidBook {
            field,
            reason: reason.to_string(),
        }
    }

    /// Returns the typed database error kind, when this is a database error.
    #[must_use]
    pub fn database_kind(&self) -> Option<DbErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::InvalidBook { .. } | Self::CorruptRow { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_classified() {
        assert_eq!(
            DbErrorKind::from_sqlx(&sqlx::Error::PoolTimedOut),
            DbErrorKind::PoolTimeout
        );
        assert_eq!(
            DbErrorKind::from_sqlx(&sqlx::Error::PoolClosed),
            DbErrorKind::PoolClosed
        );
    }

    #[test]
    fn test_sqlx_error_converts_with_kind() {
        let err: RepositoryError = sqlx::Error::PoolClosed.into();
        assert_eq!(err.database_kind(), Some(DbErrorKind::PoolClosed));
        assert!(err.to_string().starts_with("database error (pool_closed)"));
    }

    #[test]
    fn test_invalid_book_message_has_suggestion() {
        let err = RepositoryError::invalid_book("title", "must not be empty");
        assert!(err.to_string().contains("invalid book 'title'"));
        assert!(err.to_string().contains("Suggestion"));
        assert_eq!(err.database_kind(), None);
    }
}
