//! Account administration error types
//!
//! A closed taxonomy: every workflow fails with exactly one of these, and
//! callers map the kind to their own status semantics.

use std::fmt;

use ldapadmin_directory::account::Account;
use ldapadmin_directory::error::{ChangesParseError, StoreError};
use thiserror::Error;

/// Mutation attempted against a protected identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ProtectedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtectedAction::Create => "The user is protected",
            ProtectedAction::Update => "The user is protected, it cannot be updated",
            ProtectedAction::Delete => "The user is protected, it cannot be deleted",
        })
    }
}

/// Error kinds, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Protected,
    DuplicatedEmail,
    StoreUnavailable,
    PartialFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Protected => "protected",
            ErrorKind::DuplicatedEmail => "duplicated_email",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::PartialFailure => "partial_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by account workflows.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Request rejected before touching the directory.
    #[error("{0}")]
    InvalidArgument(String),

    /// No account exists under the identifier.
    #[error("not_found")]
    NotFound { uid: String },

    /// The identifier is in the protected set.
    #[error("{action}: {uid}")]
    Protected { uid: String, action: ProtectedAction },

    /// Another account already uses the mail address.
    #[error("duplicated_email")]
    DuplicatedEmail { mail: String },

    /// The directory could not answer.
    #[error("directory unavailable: {message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The account was written but a follow-up step failed.
    ///
    /// The account is kept; only the failed step needs retrying.
    #[error("account {} saved but {detail}", .account.uid)]
    PartialFailure { account: Box<Account>, detail: String },
}

impl AccountError {
    /// Create an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        AccountError::InvalidArgument(reason.into())
    }

    /// Create a not found error.
    pub fn not_found(uid: impl Into<String>) -> Self {
        AccountError::NotFound { uid: uid.into() }
    }

    /// Create a protected identity error.
    pub fn protected(uid: impl Into<String>, action: ProtectedAction) -> Self {
        AccountError::Protected {
            uid: uid.into(),
            action,
        }
    }

    /// Create a duplicated email error.
    pub fn duplicated_email(mail: impl Into<String>) -> Self {
        AccountError::DuplicatedEmail { mail: mail.into() }
    }

    /// Create a store unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        AccountError::StoreUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a partial failure error.
    pub fn partial_failure(account: Account, detail: impl Into<String>) -> Self {
        AccountError::PartialFailure {
            account: Box::new(account),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AccountError::NotFound { .. } => ErrorKind::NotFound,
            AccountError::Protected { .. } => ErrorKind::Protected,
            AccountError::DuplicatedEmail { .. } => ErrorKind::DuplicatedEmail,
            AccountError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            AccountError::PartialFailure { .. } => ErrorKind::PartialFailure,
        }
    }

    /// Check if this error is a conflict with existing directory state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AccountError::Protected { .. } | AccountError::DuplicatedEmail { .. }
        )
    }

    /// Check if the caller can fix this error by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AccountError::InvalidArgument(_) | AccountError::NotFound { .. }
        ) || self.is_conflict()
    }

    /// Check if this error comes from the directory side.
    pub fn is_server_fault(&self) -> bool {
        !self.is_client_error()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccountError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AccountError::NotFound { .. } => "NOT_FOUND",
            AccountError::Protected { .. } => "PROTECTED",
            AccountError::DuplicatedEmail { .. } => "DUPLICATED_EMAIL",
            AccountError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            AccountError::PartialFailure { .. } => "PARTIAL_FAILURE",
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { uid } => AccountError::NotFound { uid },
            StoreError::Unavailable { message, source } => {
                AccountError::StoreUnavailable { message, source }
            }
        }
    }
}

impl From<ChangesParseError> for AccountError {
    fn from(err: ChangesParseError) -> Self {
        AccountError::InvalidArgument(err.to_string())
    }
}

/// Result type for account workflows.
pub type AccountResult<T> = Result<T, AccountError>;
