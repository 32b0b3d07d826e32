//! Directory store error types
//!
//! The adapter reports exactly two things: the entry is not there, or the
//! directory could not answer. Everything finer-grained stays in `message`.

use thiserror::Error;

/// Error that can occur during directory store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entry exists for the identifier.
    #[error("entry not found: {uid}")]
    NotFound { uid: String },

    /// Transport, search, or write failure.
    #[error("directory unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Create a not found error.
    pub fn not_found(uid: impl Into<String>) -> Self {
        StoreError::NotFound { uid: uid.into() }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error with source.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "ENTRY_NOT_FOUND",
            StoreError::Unavailable { .. } => "DIRECTORY_UNAVAILABLE",
        }
    }
}

/// Result type for directory store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The default role could not be granted.
#[derive(Debug, Error)]
#[error("failed to assign role {role} to {uid}: {message}")]
pub struct RoleAssignmentError {
    pub role: String,
    pub uid: String,
    pub message: String,
}

impl RoleAssignmentError {
    pub fn new(role: impl Into<String>, uid: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            uid: uid.into(),
            message: message.into(),
        }
    }
}

/// Configuration rejected by `validate()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A partial update payload could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("params_not_understood: {reason}")]
pub struct ChangesParseError {
    pub reason: String,
}

impl ChangesParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
