//! # Publication Errors

use thiserror::Error;

use brit_core::{ObjectRef, ObjectType};

/// Failure reported by an [`ObjectStore`](crate::ObjectStore) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage could not be read or written.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Stored data could not be decoded.
    #[error("corrupt stored object {object}: {reason}")]
    Corrupt {
        /// The object that failed to decode.
        object: ObjectRef,
        /// Decoder diagnostic.
        reason: String,
    },
}

/// Errors from the registry, prepublish checker, and cascade executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublicationError {
    /// A relation rule could not be resolved on an object of its type. This
    /// is a programming error in the registry, not bad user input.
    #[error("misconfigured dependency {object_type}.{accessor}: {reason}")]
    MisconfiguredDependency {
        /// Type the rule is registered for.
        object_type: ObjectType,
        /// The rule's accessor name.
        accessor: String,
        /// Resolver diagnostic.
        reason: String,
    },

    /// The same type was registered twice.
    #[error("dependency configuration for {0} registered twice")]
    DuplicateRegistration(ObjectType),

    /// The object store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
