//! Error types for daycard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, validation, missing session, unknown task)
//! - 3: Auth rejected (bad credentials, email already registered)
//! - 4: Operation failed (I/O, corrupt store, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the daycard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const AUTH_REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for daycard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Auth rejections (exit code 3)
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::Validation(_)
            | Error::NotSignedIn
            | Error::TaskNotFound(_) => exit_codes::USER_ERROR,

            Error::InvalidCredentials | Error::EmailTaken(_) => exit_codes::AUTH_REJECTED,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidArgument(message)
            | Error::InvalidConfig(message)
            | Error::Validation(message)
            | Error::OperationFailed(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            Error::EmailTaken(email) => Some(serde_json::json!({ "email": email })),
            Error::LockFailed(path) => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            _ => None,
        }
    }
}

/// Result type alias for daycard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
