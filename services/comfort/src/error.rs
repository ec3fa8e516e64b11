//! Error types for the comfort dashboard client

use std::fmt;

use crate::cache::EntityKind;

/// Errors that can occur while talking to the comfort backend
#[derive(Debug, thiserror::Error)]
pub enum ComfortError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },
}

/// Result type alias for comfort operations
pub type Result<T> = std::result::Result<T, ComfortError>;

/// Coarse classification of a failed user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced a response
    Network,
    /// The server rejected the request
    Validation,
    /// The target entity is not in the cache
    NotFound,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network failure"),
            FailureKind::Validation => write!(f, "validation failure"),
            FailureKind::NotFound => write!(f, "not found"),
        }
    }
}

/// A mutation failure as surfaced to the user
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify `err`, keeping the server's own message when it sent one.
    pub fn from_error(err: &ComfortError, fallback: &str) -> Self {
        match err {
            ComfortError::Status { message, .. } if !message.trim().is_empty() => {
                Self::new(FailureKind::Validation, message.clone())
            }
            ComfortError::Status { .. } | ComfortError::Json(_) | ComfortError::Config(_) => {
                Self::new(FailureKind::Validation, fallback)
            }
            ComfortError::Http(_) => Self::new(FailureKind::Network, fallback),
            ComfortError::NotFound { .. } => Self::new(FailureKind::NotFound, err.to_string()),
        }
    }
}

/// Outcome of a user-initiated mutation; `Ok` carries the confirmation text
pub type MutationResult = std::result::Result<String, Failure>;
