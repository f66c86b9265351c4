//! # Object Type Keys
//!
//! [`ObjectType`] names a kind of reviewable object as a `domain.model`
//! pair (`materials.sample`, `soilcom.collection`). It keys the dependency
//! registry and derives the per-type permission codenames the policy engine
//! checks. [`ObjectRef`] pairs a type with an [`ObjectId`] and is the unit of
//! identity for loading objects and for cycle detection in cascades.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::ObjectId;

/// A `domain.model` key identifying a kind of reviewable object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectType {
    domain: String,
    model: String,
}

fn is_snake_segment(s: &str) -> bool {
    !s.is_empty()
        && s.starts_with(|c: char| c.is_ascii_lowercase())
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl ObjectType {
    /// Build a type key from its two segments.
    pub fn new(domain: &str, model: &str) -> Result<Self, ValidationError> {
        if !is_snake_segment(domain) || !is_snake_segment(model) {
            return Err(ValidationError::InvalidObjectType(format!("{domain}.{model}")));
        }
        Ok(Self {
            domain: domain.to_string(),
            model: model.to_string(),
        })
    }

    /// Parse `domain.model`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let (domain, model) = s
            .split_once('.')
            .ok_or_else(|| ValidationError::InvalidObjectType(s.to_string()))?;
        Self::new(domain, model)
    }

    /// The domain (application) segment.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The model segment.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fully qualified permission codename for `action` on this type,
    /// e.g. `materials.add_sample`.
    pub fn permission(&self, action: &str) -> String {
        format!("{}.{}_{}", self.domain, action, self.model)
    }

    /// Codename of the per-type moderation grant.
    pub fn moderate_permission(&self) -> String {
        self.permission("can_moderate")
    }

    /// Codename of the generic "add" grant.
    pub fn add_permission(&self) -> String {
        self.permission("add")
    }
}

impl TryFrom<String> for ObjectType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectType> for String {
    fn from(t: ObjectType) -> Self {
        t.to_string()
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.domain, self.model)
    }
}

/// A typed reference to one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// The object's type.
    pub object_type: ObjectType,
    /// The object's id within that type.
    pub id: ObjectId,
}

impl ObjectRef {
    /// Pair a type with an id.
    pub fn new(object_type: ObjectType, id: ObjectId) -> Self {
        Self { object_type, id }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.object_type, self.id)
    }
}
