//! Error types for Huddle session coordination.
//!
//! Every fallible operation in the workspace returns [`Result<T>`] with
//! [`SessionError`]. The error is `Clone` because a single in-flight request
//! may be awaited by many callers, and each of them receives the same
//! outcome.
//!
//! # Taxonomy
//!
//! - [`SessionError::InvalidArgument`]: a required identifier is missing or
//!   empty. Fails fast and is never retried.
//! - [`SessionError::Timeout`]: a retry schedule or try budget ran out.
//! - [`SessionError::Upstream`]: a remote collaborator call failed. Propagated
//!   unmodified, never retried by the poller.
//! - [`SessionError::Configuration`]: settings could not be loaded.
//!
//! # Example
//!
//! ```
//! use huddle_core::{Result, SessionError};
//!
//! fn require_client(id: &str) -> Result<&str> {
//!     if id.is_empty() {
//!         return Err(SessionError::invalid_argument("clientId", "must not be empty"));
//!     }
//!     Ok(id)
//! }
//!
//! assert!(require_client("").is_err());
//! ```

use std::fmt;

use thiserror::Error;

/// Main error type for session coordination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A required argument was missing or empty.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the offending argument
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// An operation ran out of attempts.
    #[error("timed out attempting to {operation} after {attempts} attempt(s)")]
    Timeout {
        /// Description of what was being attempted
        operation: String,
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// A remote collaborator failed.
    #[error("upstream failure during {operation}: {message}")]
    Upstream {
        /// Collaborator operation that failed
        operation: String,
        /// Rendered error reported by the collaborator
        message: String,
    },

    /// Settings could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SessionError {
    /// Creates an InvalidArgument error.
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Timeout error.
    ///
    /// ```
    /// use huddle_core::SessionError;
    ///
    /// let err = SessionError::timeout("register client", 6);
    /// assert_eq!(
    ///     err.to_string(),
    ///     "timed out attempting to register client after 6 attempt(s)"
    /// );
    /// ```
    pub fn timeout(operation: impl Into<String>, attempts: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            attempts,
        }
    }

    /// Wraps a collaborator error.
    pub fn upstream(operation: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::Upstream {
            operation: operation.into(),
            message: error.to_string(),
        }
    }

    /// Creates a Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true if an attempt budget was exhausted.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if this is an invalid argument error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns true if a collaborator failed.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Returns true if a later, independent attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Upstream { .. })
    }
}

/// Type alias for Results with SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;
