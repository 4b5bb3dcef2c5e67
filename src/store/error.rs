//! Record store error types
//!
//! Defines all errors that can occur in the record store layer.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur in the record store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A record of this kind already exists for the user and date
    #[error("A {kind} for {date} already exists")]
    Duplicate { kind: &'static str, date: NaiveDate },

    /// Requested record does not exist (or is not visible to the caller)
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// Write rejected because it references invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// I/O failure while preparing the database location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        StoreError::NotFound { kind, id }
    }

    /// Whether this error is the duplicate (user, date) failure kind
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Duplicate {
            kind: "health log",
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert_eq!(err.to_string(), "A health log for 2024-03-01 already exists");
        assert!(err.is_duplicate());

        let err = StoreError::not_found("meal", 12);
        assert_eq!(err.to_string(), "meal 12 not found");
        assert!(!err.is_duplicate());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}
