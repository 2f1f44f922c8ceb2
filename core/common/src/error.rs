//! Common error types for resilink.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed operation, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-correctable input problem. No remote call was made.
    InvalidInput,
    /// Bad credentials or identity verification failure.
    Unauthenticated,
    /// The backing store is missing required structure.
    SchemaNotReady,
    /// Generic profile persistence failure.
    ProfileWriteFailed,
    /// Object upload was rejected by the backend.
    UploadFailed,
    /// No storage candidate answered a listing call.
    NoLocationFound,
}

impl ErrorKind {
    /// Message shown to the person driving the operation.
    ///
    /// `SchemaNotReady` is phrased for an operator, not as a credential error.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "Email and password are required",
            ErrorKind::Unauthenticated => "Sign-in failed. Check your email and password",
            ErrorKind::SchemaNotReady => {
                "Database schema not ready. Initialize the backing store (run `resilink setup profiles` or apply migrations) first"
            }
            ErrorKind::ProfileWriteFailed => "Could not save profile",
            ErrorKind::UploadFailed => "Upload failed",
            ErrorKind::NoLocationFound => "Failed to load files",
        }
    }

    /// Whether fixing this requires operator action rather than user input.
    pub fn is_operator_actionable(&self) -> bool {
        matches!(self, ErrorKind::SchemaNotReady)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::SchemaNotReady => "schema not ready",
            ErrorKind::ProfileWriteFailed => "profile write failed",
            ErrorKind::UploadFailed => "upload failed",
            ErrorKind::NoLocationFound => "no location found",
        };
        f.write_str(name)
    }
}

/// Top-level error type for resilink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Identity could not be authenticated.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Profile store exists but lacks its schema.
    #[error("Schema not ready: {0}")]
    SchemaNotReady(String),

    /// Profile write failed for any other reason.
    #[error("Profile write failed: {0}")]
    ProfileWriteFailed(String),

    /// Upload rejected by the object store.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Every storage candidate failed.
    #[error("No location found: {}", .last_error.as_deref().unwrap_or("no candidates were probed"))]
    NoLocationFound {
        /// Message of the last failed probe, if any probe ran.
        last_error: Option<String>,
    },

    /// Transport-level failure talking to the backend.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with an error message.
    #[error("{0}")]
    Backend(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an error from a non-success backend response.
    ///
    /// The message is taken from the first present field among `msg`,
    /// `error_description`, `message` and `error`. Falls back to the raw body,
    /// then to the status code.
    pub fn from_backend_body(status: u16, body: &str) -> Self {
        const MESSAGE_FIELDS: [&str; 4] = ["msg", "error_description", "message", "error"];

        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = parsed.as_ref().and_then(|value| {
            MESSAGE_FIELDS.iter().find_map(|field| match value.get(*field) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(serde_json::Value::Object(inner)) => inner
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                _ => None,
            })
        });

        match message {
            Some(message) => Error::Backend(message),
            None if !body.trim().is_empty() => Error::Backend(body.trim().to_string()),
            None => Error::Backend(format!("backend returned status {}", status)),
        }
    }

    /// Typed classification, if this error belongs to the caller-facing taxonomy.
    ///
    /// Transport and backend errors return `None`; components classify those
    /// at the call site.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::InvalidInput(_) => Some(ErrorKind::InvalidInput),
            Error::Unauthenticated(_) => Some(ErrorKind::Unauthenticated),
            Error::SchemaNotReady(_) => Some(ErrorKind::SchemaNotReady),
            Error::ProfileWriteFailed(_) => Some(ErrorKind::ProfileWriteFailed),
            Error::UploadFailed(_) => Some(ErrorKind::UploadFailed),
            Error::NoLocationFound { .. } => Some(ErrorKind::NoLocationFound),
            _ => None,
        }
    }

    /// The underlying message without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Error::InvalidInput(m)
            | Error::Unauthenticated(m)
            | Error::SchemaNotReady(m)
            | Error::ProfileWriteFailed(m)
            | Error::UploadFailed(m)
            | Error::Network(m)
            | Error::Backend(m)
            | Error::Serialization(m)
            | Error::Config(m) => m.clone(),
            Error::NoLocationFound { last_error } => last_error.clone().unwrap_or_default(),
            Error::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
