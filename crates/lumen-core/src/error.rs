//! Error types for the Lumen client.
//!
//! Errors are grouped by component so that the CLI can report what failed
//! (login, the remote API, the local index) together with the relevant context.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Lumen operations.
#[derive(Error, Debug)]
pub enum LumenError {
    /// No stored credential; the user must log in first
    #[error("Not authenticated. Run `lumen login` first.")]
    NotAuthenticated,

    /// Input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Device login errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Remote vision API errors
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Embedding index errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Credential file errors
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by the device-authorization flow.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The device code request failed (network or non-success response)
    #[error("Device code request failed: {0}")]
    Request(String),

    /// The user denied the authorization request
    #[error("Access denied: the authorization request was declined")]
    AccessDenied,

    /// The device code expired before the user approved it
    #[error("The device code expired. Run `lumen login` again.")]
    Expired,

    /// Any other polling failure, carrying the server description
    #[error("Polling failed: {0}")]
    Poll(String),

    /// Fetching the user session failed
    #[error("Session request failed: {0}")]
    Session(String),
}

/// Errors returned by the remote vision API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success response or transport failure
    #[error("API error: {message}")]
    Remote {
        message: String,
        status_code: Option<u16>,
    },

    /// The account has no credits left for this operation
    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    /// The response could not be decoded
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Classify a server message, special-casing credit exhaustion.
    pub fn from_message(message: impl Into<String>, status_code: Option<u16>) -> Self {
        let message = message.into();
        if message.to_lowercase().contains("credits") {
            ApiError::InsufficientCredits(message)
        } else {
            ApiError::Remote {
                message,
                status_code,
            }
        }
    }
}

/// Embedding index (`.index.db`) errors.
#[derive(Error, Debug)]
pub enum IndexError {
    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored embedding could not be encoded or decoded
    #[error("Embedding encoding error for {path}: {message}")]
    Encoding { path: String, message: String },
}

/// Credential file errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read or write the credential file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential file is not valid JSON
    #[error("Malformed credential file: {0}")]
    Json(#[from] serde_json::Error),

    /// Refused to persist a credential without an access token
    #[error("Refusing to store a credential with an empty access token")]
    EmptyToken,
}

/// Convenience type alias for Lumen results.
pub type Result<T> = std::result::Result<T, LumenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credits_message_is_special_cased() {
        let err = ApiError::from_message("Not enough credits to run this request", Some(402));
        assert!(matches!(err, ApiError::InsufficientCredits(_)));
    }

    #[test]
    fn test_credits_match_is_case_insensitive() {
        let err = ApiError::from_message("CREDITS exhausted", None);
        assert!(matches!(err, ApiError::InsufficientCredits(_)));
    }

    #[test]
    fn test_other_messages_are_remote_errors() {
        let err = ApiError::from_message("Unsupported image", Some(400));
        match err {
            ApiError::Remote {
                message,
                status_code,
            } => {
                assert_eq!(message, "Unsupported image");
                assert_eq!(status_code, Some(400));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_not_authenticated_message_mentions_login() {
        assert!(LumenError::NotAuthenticated
            .to_string()
            .contains("lumen login"));
    }
}
