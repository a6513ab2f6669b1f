//! Core error types for testcrack-core.
//!
//! One `thiserror` enum per concern, gathered under [`CoreError`] so callers
//! that don't care about the concern can use `?` throughout.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::Phase;

/// Core error type for testcrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote service errors
    #[error("Service error: {0}")]
    Gateway(#[from] GatewayError),

    /// Session controller misuse
    #[error("Session error: {0}")]
    Transition(#[from] TransitionError),

    /// Malformed assessment content
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential persistence errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Sign-in / sign-up errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by the remote content/grading service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network failure, 5xx, or a payload that could not be understood.
    #[error("Content unavailable: {0}")]
    ContentUnavailable(String),

    /// The service refused the submitted answer set.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// HTTP 401: the stored session token is no longer accepted.
    #[error("Session expired or invalid, please sign in again")]
    Unauthorized,
}

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GatewayError::ContentUnavailable(_) => FailureKind::ContentUnavailable,
            GatewayError::SubmissionRejected(_) => FailureKind::SubmissionRejected,
            GatewayError::Unauthorized => FailureKind::Unauthorized,
        }
    }
}

/// Discriminant of a [`GatewayError`], kept in the session state so the
/// presentation layer can react (e.g. send the user back to sign in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ContentUnavailable,
    SubmissionRejected,
    Unauthorized,
}

/// The caller asked the controller for a transition its current phase
/// does not allow. This is a contract violation on the caller's side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("'{operation}' is not allowed while the session is {phase:?}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },
}

/// Structural problems with an [`AssessmentContent`](crate::AssessmentContent).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("passage is empty")]
    EmptyPassage,

    #[error("assessment has no questions")]
    NoQuestions,

    #[error("question {index} has {count} option(s), at least 2 required")]
    TooFewOptions { index: usize, count: usize },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be determined or created
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Credential store errors.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to access credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored credentials are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Client-side form validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
}

/// Sign-in / sign-up errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service answered but refused the credentials.
    #[error("{0}")]
    Rejected(String),

    #[error("Auth request failed: {0}")]
    Transport(String),

    #[error("Already signed in as {0}; log out first")]
    AlreadyAuthenticated(String),

    #[error("Not signed in; run `testcrack auth signin` first")]
    NotAuthenticated,

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_kind_matches_variant() {
        assert_eq!(
            GatewayError::ContentUnavailable("x".into()).kind(),
            FailureKind::ContentUnavailable
        );
        assert_eq!(
            GatewayError::SubmissionRejected("x".into()).kind(),
            FailureKind::SubmissionRejected
        );
        assert_eq!(GatewayError::Unauthorized.kind(), FailureKind::Unauthorized);
    }

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::PasswordTooShort { min: 6 }.to_string(),
            "Password must be at least 6 characters long"
        );
        let err: AuthError = ValidationError::PasswordMismatch.into();
        assert_eq!(err.to_string(), "Passwords do not match");
    }
}
