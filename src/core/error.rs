/// Miniblog Error Module
///
/// This module defines the error types shared across the application.
/// It provides structured error handling with proper error propagation and
/// user-friendly error messages.
use thiserror::Error;

/// Error type covering every failure the application reports.
///
/// Driver-level errors are classified at the call site into one of the
/// database variants rather than converted wholesale, so a failure always
/// carries the phase it happened in:
/// - `Connection` for opening, validating and pinging the database
/// - `Query` for statement preparation, binding and execution
/// - `Transaction` for begin/commit/rollback sequencing
#[derive(Error, Debug)]
pub enum MiniblogError {
    /// Errors establishing or keeping a database connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement errors (syntax, parameter binding, execution)
    #[error("Query error: {0}")]
    Query(String),

    /// Transaction sequencing errors (begin/commit/rollback misuse)
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors (query log export)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic application errors for unexpected conditions
    #[error("Application error: {0}")]
    App(String),
}

/// Type alias for Result to use MiniblogError as the error type.
///
/// This provides a consistent error type across the entire application
/// instead of using `Result<T, String>` or mixed error types.
pub type Result<T> = std::result::Result<T, MiniblogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let conn_err = MiniblogError::Connection("refused".to_string());
        assert!(conn_err.to_string().contains("Connection error"));

        let query_err = MiniblogError::Query("Syntax error".to_string());
        assert!(query_err.to_string().contains("Query error"));

        let tx_err = MiniblogError::Transaction("no transaction in progress".to_string());
        assert!(tx_err.to_string().contains("Transaction error"));

        let config_err = MiniblogError::Config("Invalid config".to_string());
        assert!(config_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: MiniblogError = io_err.into();
        match app_err {
            MiniblogError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        // Test JSON error conversion
        let json_str = "{ invalid json }";
        let json_err: std::result::Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str(json_str);
        let app_err: MiniblogError = json_err.unwrap_err().into();
        match app_err {
            MiniblogError::Json(_) => {}
            _ => panic!("Expected JSON error"),
        }
    }
}
