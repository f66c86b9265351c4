//! # Policy and Action Errors

use thiserror::Error;

use brit_core::ObjectRef;
use brit_publication::{PrepublishReport, PublicationError, StoreError};
use brit_state::TransitionError;

/// Failure while deriving a single policy flag.
///
/// Never escapes [`compute_policy`](crate::compute_policy): the flag falls
/// back to its conservative value and the error is logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The identity backend could not answer a permission query.
    #[error("permission lookup for {codename} failed: {reason}")]
    PermissionLookup {
        /// The queried codename.
        codename: String,
        /// Backend diagnostic.
        reason: String,
    },
}

/// A guarded workflow action was refused or failed.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The target object does not exist.
    #[error("object {0} not found")]
    NotFound(ObjectRef),

    /// The policy does not grant the action to this user.
    #[error("{action} on {object} not permitted: {reason}")]
    PermissionDenied {
        /// The attempted action.
        action: &'static str,
        /// The target object.
        object: ObjectRef,
        /// Why the policy refused.
        reason: String,
    },

    /// Prepublish check found unmet requirements.
    #[error("{} cannot be published: {}", .0.object, .0.checklist().join("; "))]
    Blocked(Box<PrepublishReport>),

    /// The state machine rejected the transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Dependency resolution or persistence failed.
    #[error(transparent)]
    Publication(#[from] PublicationError),
}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        Self::Publication(PublicationError::Store(e))
    }
}
