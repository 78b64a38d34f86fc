//! Error types for partybook.
//!
//! This module defines the crate-level error type used by configuration,
//! cart storage and server startup. Request-level failures of the booking
//! endpoint live in [`crate::booking::BookingError`], which maps onto HTTP
//! status codes instead.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for partybook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the cart database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Catalog / Cart Errors ===
    /// No package with the given identifier exists in the catalog.
    #[error("unknown package '{id}'")]
    UnknownPackage {
        /// The identifier that was looked up.
        id: String,
    },

    // === Mail Errors ===
    /// The SMTP transport could not be built from configuration.
    #[error("failed to configure mail transport: {0}")]
    MailSetup(String),

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for partybook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an unknown package error.
    #[must_use]
    pub fn unknown_package(id: impl Into<String>) -> Self {
        Self::UnknownPackage { id: id.into() }
    }

    /// Create a mail setup error.
    #[must_use]
    pub fn mail_setup(message: impl Into<String>) -> Self {
        Self::MailSetup(message.into())
    }

    /// Check if this error came from decoding stored data.
    #[must_use]
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_package("package-z");
        assert_eq!(err.to_string(), "unknown package 'package-z'");
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::config("window_secs must be greater than 0");
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("window_secs"));
    }

    #[test]
    fn test_mail_setup_error() {
        let err = Error::mail_setup("bad relay");
        assert_eq!(err.to_string(), "failed to configure mail transport: bad relay");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("address in use"));
    }

    #[test]
    fn test_from_json_error_is_corrupt() {
        let json_result: std::result::Result<Vec<i32>, serde_json::Error> =
            serde_json::from_str("{not json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(err.is_corrupt_data());
        }
        assert!(!Error::config("x").is_corrupt_data());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/cart.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
