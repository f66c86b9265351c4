//! # Validation Errors
//!
//! Errors raised when a domain primitive is constructed from untrusted
//! input (CLI arguments, store files, configuration). Each variant names
//! the offending value so operators can fix the input without a debugger.

use thiserror::Error;

/// A domain primitive failed validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is empty or contains characters outside the allowed set.
    #[error("invalid {kind} identifier {value:?}: {reason}")]
    InvalidIdentifier {
        /// Which identifier namespace was being constructed.
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Object type key is not of the form `domain.model`.
    #[error("invalid object type {0:?}: expected `<domain>.<model>` in lowercase snake case")]
    InvalidObjectType(String),

    /// Timestamp could not be parsed as RFC 3339.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Publication status name is not one of the known states.
    #[error("unknown publication status {0:?}")]
    UnknownStatus(String),
}
