//! # Object Store
//!
//! The persistence collaborator: load an object by reference, save a
//! mutated object, and run a block atomically. [`InMemoryStore`] backs the
//! CLI and the tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use brit_core::ObjectRef;
use brit_state::Reviewable;

use crate::error::StoreError;

/// Persistence contract used by the cascade executor and workflow actions.
pub trait ObjectStore {
    /// The stored object type.
    type Object: Reviewable + Clone;

    /// Load an object. `Ok(None)` when no such object exists.
    fn load(&self, object: &ObjectRef) -> Result<Option<Self::Object>, StoreError>;

    /// Persist an object, replacing any previous version.
    fn save(&mut self, object: &Self::Object) -> Result<(), StoreError>;

    /// Run `f` so that either all of its writes become visible or none do.
    fn atomic<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Self) -> Result<R, E>,
        E: From<StoreError>;
}

/// Cloneable in-memory store keyed by [`ObjectRef`].
///
/// Clones share the same data. `atomic` snapshots the map and restores it
/// if the block fails. Not safe for two writers running `atomic` blocks at
/// once; callers serialize those.
#[derive(Debug)]
pub struct InMemoryStore<O> {
    data: Arc<RwLock<BTreeMap<ObjectRef, O>>>,
}

impl<O> Clone for InMemoryStore<O> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<O: Reviewable + Clone> InMemoryStore<O> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Build a store holding `objects`. Later duplicates replace earlier ones.
    pub fn from_objects(objects: impl IntoIterator<Item = O>) -> Self {
        let store = Self::new();
        for object in objects {
            store.insert(object);
        }
        store
    }

    /// Insert an object, returning the previous version if any.
    pub fn insert(&self, object: O) -> Option<O> {
        self.data.write().insert(object.object_ref(), object)
    }

    /// Retrieve a copy of an object.
    pub fn get(&self, object: &ObjectRef) -> Option<O> {
        self.data.read().get(object).cloned()
    }

    /// All objects in reference order.
    pub fn list(&self) -> Vec<O> {
        self.data.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: Reviewable + Clone> Default for InMemoryStore<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Reviewable + Clone> ObjectStore for InMemoryStore<O> {
    type Object = O;

    fn load(&self, object: &ObjectRef) -> Result<Option<O>, StoreError> {
        Ok(self.get(object))
    }

    fn save(&mut self, object: &O) -> Result<(), StoreError> {
        self.insert(object.clone());
        Ok(())
    }

    fn atomic<R, E, F>(&mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Self) -> Result<R, E>,
        E: From<StoreError>,
    {
        let snapshot = self.data.read().clone();
        let result = f(self);
        if result.is_err() {
            tracing::debug!(objects = snapshot.len(), "atomic block failed, restoring snapshot");
            *self.data.write() = snapshot;
        }
        result
    }
}
