//! # Identity Newtypes
//!
//! Identifiers for reviewable objects and for the users who own and
//! moderate them. Both are opaque strings validated at construction; the
//! store may use database keys, slugs, or UUID strings interchangeably.
//!
//! ## Validation
//!
//! - Non-empty, at most 128 bytes.
//! - ASCII alphanumerics plus `-`, `_`, `.`, `:` and `@` only, so an id can
//!   appear unquoted in a `model#id` reference and on a command line.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of the sentinel owner assigned to records created without
/// an explicit owner.
pub const DEFAULT_OWNER_ID: &str = "brit-default-owner";

const MAX_IDENTIFIER_LEN: usize = 128;

fn validate_identifier(kind: &'static str, s: &str) -> Result<(), ValidationError> {
    let reject = |reason| ValidationError::InvalidIdentifier {
        kind,
        value: s.to_string(),
        reason,
    };
    if s.is_empty() {
        return Err(reject("must not be empty"));
    }
    if s.len() > MAX_IDENTIFIER_LEN {
        return Err(reject("must be at most 128 bytes"));
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@'))
    {
        return Err(reject("contains characters outside [A-Za-z0-9-_.:@]"));
    }
    Ok(())
}

/// Identifier of a reviewable object, unique within its [`ObjectType`](crate::ObjectType).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Create an object identifier from a string, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_identifier("object", &s)?;
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier from a string, validating format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        validate_identifier("user", &s)?;
        Ok(Self(s))
    }

    /// The sentinel owner for records created without one.
    pub fn default_owner() -> Self {
        Self(DEFAULT_OWNER_ID.to_string())
    }

    /// Whether this is the sentinel default owner.
    pub fn is_default_owner(&self) -> bool {
        self.0 == DEFAULT_OWNER_ID
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
