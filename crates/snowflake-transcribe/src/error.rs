//! Error types for the account replication library.

use thiserror::Error;

use crate::core::ObjectCategory;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for configuration errors (missing fields, invalid YAML).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection/authentication failures.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for failed catalog introspection.
pub const EXIT_CATALOG_ERROR: u8 = 3;
/// Exit code for a rejected statement when running with `on_error: abort`.
pub const EXIT_STATEMENT_ERROR: u8 = 4;
/// Exit code for teardown failures.
pub const EXIT_ROLLBACK_ERROR: u8 = 5;
/// Exit code for rows that cannot be turned into statements.
pub const EXIT_MAPPING_ERROR: u8 = 6;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for replication operations.
#[derive(Error, Debug)]
pub enum TranscribeError {
    /// Configuration error (invalid YAML, missing credential entries, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source or target account unreachable or rejected authentication
    #[error("Connection to account {account} failed: {message}")]
    Connection { account: String, message: String },

    /// Introspection query failed or returned an unexpected shape
    #[error("Catalog read failed for {category}: {message}")]
    Catalog {
        category: ObjectCategory,
        message: String,
    },

    /// A single statement was rejected by the target account
    #[error("Statement rejected: {message}\n  SQL: {sql}")]
    Statement { sql: String, message: String },

    /// One or more drop statements failed during teardown
    #[error("Rollback failed: {0}")]
    Rollback(String),

    /// Identifier failed validation before quoting
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// A typed record could not be turned into a statement
    #[error("Cannot map {category} {object}: {message}")]
    Mapping {
        category: ObjectCategory,
        object: String,
        message: String,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TranscribeError {
    /// Create a Connection error for the given account identifier.
    pub fn connection(account: impl Into<String>, message: impl Into<String>) -> Self {
        TranscribeError::Connection {
            account: account.into(),
            message: message.into(),
        }
    }

    /// Create a Catalog (read-path) error.
    pub fn catalog(category: ObjectCategory, message: impl Into<String>) -> Self {
        TranscribeError::Catalog {
            category,
            message: message.into(),
        }
    }

    /// Create a Statement error.
    pub fn statement(sql: impl Into<String>, message: impl Into<String>) -> Self {
        TranscribeError::Statement {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create a Mapping error.
    pub fn mapping(
        category: ObjectCategory,
        object: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        TranscribeError::Mapping {
            category,
            object: object.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            TranscribeError::Config(_) | TranscribeError::Yaml(_) => EXIT_CONFIG_ERROR,
            TranscribeError::Connection { .. } => EXIT_CONNECTION_ERROR,
            TranscribeError::Catalog { .. } => EXIT_CATALOG_ERROR,
            TranscribeError::Statement { .. } => EXIT_STATEMENT_ERROR,
            TranscribeError::Rollback(_) => EXIT_ROLLBACK_ERROR,
            TranscribeError::Identifier(_) | TranscribeError::Mapping { .. } => {
                EXIT_MAPPING_ERROR
            }
            TranscribeError::Io(_) | TranscribeError::Json(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for replication operations.
pub type Result<T> = std::result::Result<T, TranscribeError>;
