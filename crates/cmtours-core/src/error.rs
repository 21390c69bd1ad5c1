//! Unified error types for the City Muscat Tours client.
//!
//! All crates map their internal failures into [`ApiError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The caller required an authenticated identity but no token is stored.
    AuthenticationRequired,
    /// The backend confirmed the session is no longer valid.
    SessionExpired,
    /// The refresh mechanism failed or the refresh token was rejected.
    /// Not fatal to the current session.
    RefreshToken,
    /// Transport-level failure: the backend could not be reached at all.
    BackendUnreachable,
    /// The backend answered with an HTML/plain-text page instead of JSON.
    BackendErrorPage,
    /// The backend rejected the request input.
    Validation,
    /// The caller lacks permission for the requested action.
    Permission,
    /// A credential storage failure occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal client error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationRequired => write!(f, "AUTHENTICATION_REQUIRED"),
            Self::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Self::RefreshToken => write!(f, "REFRESH_TOKEN"),
            Self::BackendUnreachable => write!(f, "BACKEND_UNREACHABLE"),
            Self::BackendErrorPage => write!(f, "BACKEND_ERROR_PAGE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Permission => write!(f, "PERMISSION"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified error used throughout the client.
///
/// Server-provided messages are surfaced verbatim in `message` wherever one
/// could be extracted; `validation_errors` carries the backend's field-level
/// detail when the response included one, so form-rendering callers can map
/// failures back to inputs.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Field-level validation detail from the backend, when supplied.
    pub validation_errors: Option<serde_json::Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ApiError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            validation_errors: None,
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            validation_errors: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach a field-level validation map.
    pub fn with_validation_errors(mut self, errors: serde_json::Value) -> Self {
        self.validation_errors = Some(errors);
        self
    }

    /// Create an authentication-required error.
    pub fn authentication_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthenticationRequired, message)
    }

    /// Create a session-expired error.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionExpired, message)
    }

    /// Create a refresh-token error.
    pub fn refresh_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RefreshToken, message)
    }

    /// Create a backend-unreachable error.
    pub fn backend_unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendUnreachable, message)
    }

    /// Create a backend-error-page error.
    pub fn backend_error_page(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendErrorPage, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a permission error.
    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permission, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for ApiError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            validation_errors: self.validation_errors.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
