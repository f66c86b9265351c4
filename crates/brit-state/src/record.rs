//! # Reviewable Objects
//!
//! [`Reviewable`] is the capability interface the dependency checker,
//! cascade executor, and policy engine work against. Domain structs
//! implement four accessors; the transition methods come for free and
//! attach the object's reference to any error.
//!
//! [`ReviewableRecord`] is the generic implementation used by the object
//! store: a typed header, a review state, and named relation slots holding
//! references to other records or plain values.

use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};

use brit_core::{ObjectId, ObjectRef, ObjectType, UserId};

use crate::review::{ReviewState, TransitionError};
use crate::status::PublicationStatus;

/// Which generic model operations an object type supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCapabilities {
    /// The object can be edited in place.
    #[serde(default = "enabled")]
    pub update: bool,
    /// The object can be deleted.
    #[serde(default = "enabled")]
    pub delete: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ObjectCapabilities {
    fn default() -> Self {
        Self {
            update: true,
            delete: true,
        }
    }
}

/// An object whose lifecycle is governed by the publication state machine.
pub trait Reviewable {
    /// Typed reference identifying this object.
    fn object_ref(&self) -> ObjectRef;

    /// The owning user. Never absent; unowned records carry the sentinel
    /// [`UserId::default_owner`].
    fn owner(&self) -> &UserId;

    fn review_state(&self) -> &ReviewState;

    fn review_state_mut(&mut self) -> &mut ReviewState;

    /// Generic operations the object's type supports.
    fn capabilities(&self) -> ObjectCapabilities {
        ObjectCapabilities::default()
    }

    fn status(&self) -> PublicationStatus {
        self.review_state().status()
    }

    fn submit_for_review(&mut self) -> Result<(), TransitionError> {
        let object = self.object_ref();
        self.review_state_mut()
            .submit_for_review()
            .map_err(|e| e.for_object(object))
    }

    fn withdraw_from_review(&mut self) -> Result<(), TransitionError> {
        let object = self.object_ref();
        self.review_state_mut()
            .withdraw_from_review()
            .map_err(|e| e.for_object(object))
    }

    fn approve(&mut self, by: &UserId) -> Result<(), TransitionError> {
        let object = self.object_ref();
        self.review_state_mut()
            .approve(by)
            .map_err(|e| e.for_object(object))
    }

    fn reject(&mut self) -> Result<(), TransitionError> {
        let object = self.object_ref();
        self.review_state_mut()
            .reject()
            .map_err(|e| e.for_object(object))
    }

    fn archive(&mut self) -> Result<(), TransitionError> {
        let object = self.object_ref();
        self.review_state_mut()
            .archive()
            .map_err(|e| e.for_object(object))
    }
}

/// One element of a relation: another stored object, or a plain value that
/// has no publication status of its own.
///
/// A JSON object carrying an `object_type` or `id` key is always read as a
/// reference and must validate as one. It never falls back to a plain value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelatedItem {
    /// Reference to another reviewable object.
    Object(ObjectRef),
    /// Any non-reviewable value (a literal, a lookup code, an external link).
    Value(serde_json::Value),
}

impl RelatedItem {
    fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let is_reference = value
            .as_object()
            .is_some_and(|map| map.contains_key("object_type") || map.contains_key("id"));
        if !is_reference {
            return Ok(Self::Value(value));
        }
        ObjectRef::deserialize(value).map(Self::Object)
    }
}

impl<'de> Deserialize<'de> for RelatedItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(value)
            .map_err(|e| de::Error::custom(format!("malformed object reference: {e}")))
    }
}

/// Contents of a relation slot holding at least one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelationValue {
    /// A to-many relation.
    Many(Vec<RelatedItem>),
    /// A to-one relation.
    One(RelatedItem),
}

impl<'de> Deserialize<'de> for RelationValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(RelatedItem::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => RelatedItem::from_json(other).map(Self::One),
        };
        parsed.map_err(|e| de::Error::custom(format!("malformed object reference: {e}")))
    }
}

impl RelationValue {
    /// Flatten into a list of items.
    pub fn items(&self) -> Vec<&RelatedItem> {
        match self {
            Self::Many(items) => items.iter().collect(),
            Self::One(item) => vec![item],
        }
    }
}

/// Generic stored reviewable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewableRecord {
    pub object_type: ObjectType,
    pub id: ObjectId,
    #[serde(default = "UserId::default_owner")]
    pub owner: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub review: ReviewState,
    /// Named relation slots. A slot present with `null` is an empty to-one
    /// relation; an absent slot means the type has no such relation.
    #[serde(default)]
    pub relations: BTreeMap<String, Option<RelationValue>>,
    #[serde(default)]
    pub capabilities: ObjectCapabilities,
}

impl ReviewableRecord {
    /// A new private record.
    pub fn new(
        object_type: ObjectType,
        id: ObjectId,
        owner: UserId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            object_type,
            id,
            owner,
            name: name.into(),
            review: ReviewState::new(),
            relations: BTreeMap::new(),
            capabilities: ObjectCapabilities::default(),
        }
    }

    /// Set a to-one relation to another object.
    pub fn with_reference(mut self, slot: &str, target: ObjectRef) -> Self {
        self.relations.insert(
            slot.to_string(),
            Some(RelationValue::One(RelatedItem::Object(target))),
        );
        self
    }

    /// Set a to-many relation to other objects.
    pub fn with_references(
        mut self,
        slot: &str,
        targets: impl IntoIterator<Item = ObjectRef>,
    ) -> Self {
        let items = targets.into_iter().map(RelatedItem::Object).collect();
        self.relations
            .insert(slot.to_string(), Some(RelationValue::Many(items)));
        self
    }

    /// Declare a relation slot with no value.
    pub fn with_empty_relation(mut self, slot: &str) -> Self {
        self.relations.insert(slot.to_string(), None);
        self
    }

    /// Set a relation slot to an arbitrary value.
    pub fn with_relation(mut self, slot: &str, value: RelationValue) -> Self {
        self.relations.insert(slot.to_string(), Some(value));
        self
    }

    /// Look up a relation slot. `None` when the slot does not exist at all;
    /// `Some(None)` when it exists but is empty.
    pub fn relation(&self, slot: &str) -> Option<Option<&RelationValue>> {
        self.relations.get(slot).map(Option::as_ref)
    }
}

impl Reviewable for ReviewableRecord {
    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.object_type.clone(), self.id.clone())
    }

    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn review_state(&self) -> &ReviewState {
        &self.review
    }

    fn review_state_mut(&mut self) -> &mut ReviewState {
        &mut self.review
    }

    fn capabilities(&self) -> ObjectCapabilities {
        self.capabilities
    }
}
