//! Error handling types for irodori
//!
//! Version skew between edits and classification results is never an error;
//! the variants here cover contract violations by callers and failures of the
//! collaborators around the core (configuration files, the task executor).

use std::sync::PoisonError;
use thiserror::Error;
use tower_lsp_server::ls_types::Position;

/// Error type for colorization operations
#[derive(Debug, Error)]
pub enum ColorizeError {
    /// A range or change whose start lies after its end
    #[error("Invalid range: start {}:{} is after end {}:{}", .start.line, .start.character, .end.line, .end.character)]
    InvalidRange { start: Position, end: Position },

    /// An edit recorded with a version that does not increase
    #[error("Edit version {version} is not greater than latest recorded version {latest}")]
    NonMonotonicVersion { version: i32, latest: i32 },

    /// Document is not tracked
    #[error("Document not found: {uri}")]
    DocumentNotFound { uri: String },

    /// Document is already tracked
    #[error("Document already open: {uri}")]
    DocumentAlreadyOpen { uri: String },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The serialized executor is no longer running
    #[error("Executor is closed")]
    ExecutorClosed,
}

/// Result type for colorization operations
pub type ColorizeResult<T> = Result<T, ColorizeError>;

/// Helper trait to recover guards from poisoned locks
pub trait LockResultExt<T> {
    /// Recover the guard from a poisoned lock, logging which operation hit it.
    ///
    /// The context parameter identifies which operation triggered lock recovery.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "irodori::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}

impl ColorizeError {
    /// Create an invalid range error
    pub fn invalid_range(start: Position, end: Position) -> Self {
        ColorizeError::InvalidRange { start, end }
    }

    /// Create a non-monotonic version error
    pub fn non_monotonic(version: i32, latest: i32) -> Self {
        ColorizeError::NonMonotonicVersion { version, latest }
    }

    /// Create a document not found error
    pub fn document_not_found(uri: impl Into<String>) -> Self {
        ColorizeError::DocumentNotFound { uri: uri.into() }
    }

    /// Create a document already open error
    pub fn document_already_open(uri: impl Into<String>) -> Self {
        ColorizeError::DocumentAlreadyOpen { uri: uri.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ColorizeError::Config {
            message: message.into(),
        }
    }

    /// True for errors caused by the caller breaking the edit/range contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ColorizeError::InvalidRange { .. } | ColorizeError::NonMonotonicVersion { .. }
        )
    }
}
