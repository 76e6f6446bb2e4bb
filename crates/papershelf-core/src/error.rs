//! Error types for the papershelf cache.
//!
//! The taxonomy is deliberately small: opening the database, rejecting bad
//! caller input, and faulting storage operations are the only failure
//! classes, and each has a different propagation policy (see `cache`).

use thiserror::Error;

/// Main error type for papershelf operations.
#[derive(Debug, Error)]
pub enum PapershelfError {
    // Open errors: the database connection could not be established.
    #[error("Failed to open PDF store: {message}")]
    Open {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Precondition errors: the caller handed a write operation invalid input.
    #[error("Invalid {field}: {message}")]
    Precondition { field: String, message: String },

    // Storage errors: a read or write against an open connection failed.
    #[error("Storage operation failed: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // A record for this URL already exists; the unique index rejected the
    // insert. Classified as a storage fault at the cache boundary.
    #[error("A record is already cached for URL: {url}")]
    Duplicate { url: String },
}

/// Result type alias for papershelf operations.
pub type Result<T> = std::result::Result<T, PapershelfError>;

// Conversion implementations for common error types

impl From<rusqlite::Error> for PapershelfError {
    fn from(err: rusqlite::Error) -> Self {
        PapershelfError::Storage {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl PapershelfError {
    /// Check if this error is a storage fault — the class the cache absorbs
    /// into safe default return values instead of propagating.
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            PapershelfError::Storage { .. } | PapershelfError::Duplicate { .. }
        )
    }

    /// Check if this error came from establishing the database connection.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, PapershelfError::Open { .. })
    }

    /// Check if this error is a caller contract violation.
    pub fn is_precondition(&self) -> bool {
        matches!(self, PapershelfError::Precondition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PapershelfError::Duplicate {
            url: "https://example.com/a.pdf".into(),
        };
        assert_eq!(
            err.to_string(),
            "A record is already cached for URL: https://example.com/a.pdf"
        );

        let err = PapershelfError::Precondition {
            field: "url".into(),
            message: "must not be empty".into(),
        };
        assert_eq!(err.to_string(), "Invalid url: must not be empty");
    }

    #[test]
    fn test_storage_fault_classification() {
        assert!(PapershelfError::Storage {
            message: "disk I/O error".into(),
            source: None,
        }
        .is_storage_fault());
        assert!(PapershelfError::Duplicate {
            url: "https://x/a.pdf".into()
        }
        .is_storage_fault());
        assert!(!PapershelfError::Open {
            message: "unable to open database file".into(),
            source: None,
        }
        .is_storage_fault());
        assert!(!PapershelfError::Precondition {
            field: "blob".into(),
            message: "must not be empty".into(),
        }
        .is_storage_fault());
    }

    #[test]
    fn test_rusqlite_conversion_is_storage_kind() {
        let err: PapershelfError = rusqlite::Error::InvalidQuery.into();
        assert!(err.is_storage_fault());
        assert!(!err.is_open_failure());
    }
}
