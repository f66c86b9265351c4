//! # Dependency Registry
//!
//! A static map from [`ObjectType`] to [`DependencyConfig`]. Built once with
//! [`RegistryBuilder`] and immutable afterwards. Types without an entry have
//! no dependency constraints: prepublish checks report nothing and cascades
//! stop at them.
//!
//! A [`RelationRule`] names a relation (`accessor`, `label`) and carries the
//! function that resolves it on an object to a flat list of
//! [`RelatedItem`]s. An empty list means the relation is unset.

use std::collections::BTreeMap;
use std::sync::Arc;

use brit_core::ObjectType;
use brit_state::{RelatedItem, ReviewableRecord};

use crate::error::PublicationError;

/// Why a resolver could not produce a defined shape for a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError(pub String);

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

type Resolver<O> = Arc<dyn Fn(&O) -> Result<Vec<RelatedItem>, ResolveError> + Send + Sync>;

/// One relation on a type that takes part in dependency checking.
pub struct RelationRule<O> {
    /// Relation name, used in reports and error messages.
    pub accessor: String,
    /// Human-readable name shown to users.
    pub label: String,
    /// Whether an unset relation is acceptable.
    pub optional: bool,
    resolve: Resolver<O>,
}

impl<O> RelationRule<O> {
    /// A rule backed by an arbitrary resolver function.
    pub fn new<F>(accessor: &str, label: &str, optional: bool, resolve: F) -> Self
    where
        F: Fn(&O) -> Result<Vec<RelatedItem>, ResolveError> + Send + Sync + 'static,
    {
        Self {
            accessor: accessor.to_string(),
            label: label.to_string(),
            optional,
            resolve: Arc::new(resolve),
        }
    }

    /// Resolve the relation on `object`.
    pub fn resolve(&self, object: &O) -> Result<Vec<RelatedItem>, ResolveError> {
        (self.resolve)(object)
    }
}

impl RelationRule<ReviewableRecord> {
    /// A rule reading the named relation slot of a [`ReviewableRecord`].
    ///
    /// A record with no slot of that name is a misconfiguration; an empty
    /// slot resolves to no items.
    pub fn slot(accessor: &str, label: &str, optional: bool) -> Self {
        let slot = accessor.to_string();
        Self::new(accessor, label, optional, move |record: &ReviewableRecord| {
            match record.relation(&slot) {
                None => Err(ResolveError(format!(
                    "{} has no relation named {slot:?}",
                    record.object_type
                ))),
                Some(None) => Ok(Vec::new()),
                Some(Some(value)) => Ok(value.items().into_iter().cloned().collect()),
            }
        })
    }
}

impl<O> Clone for RelationRule<O> {
    fn clone(&self) -> Self {
        Self {
            accessor: self.accessor.clone(),
            label: self.label.clone(),
            optional: self.optional,
            resolve: Arc::clone(&self.resolve),
        }
    }
}

impl<O> std::fmt::Debug for RelationRule<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationRule")
            .field("accessor", &self.accessor)
            .field("label", &self.label)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

/// Dependency configuration for one object type.
pub struct DependencyConfig<O> {
    /// Relations whose targets must already be published before this object
    /// can advance. Read-only gates; never cascaded.
    pub requires_published: Vec<RelationRule<O>>,
    /// Relations whose targets move along with this object's status.
    pub follows_parent: Vec<RelationRule<O>>,
}

impl<O> DependencyConfig<O> {
    pub fn new() -> Self {
        Self {
            requires_published: Vec::new(),
            follows_parent: Vec::new(),
        }
    }

    /// Add a gate relation.
    pub fn requires(mut self, rule: RelationRule<O>) -> Self {
        self.requires_published.push(rule);
        self
    }

    /// Add a cascading relation.
    pub fn follows(mut self, rule: RelationRule<O>) -> Self {
        self.follows_parent.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requires_published.is_empty() && self.follows_parent.is_empty()
    }
}

impl<O> Default for DependencyConfig<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Clone for DependencyConfig<O> {
    fn clone(&self) -> Self {
        Self {
            requires_published: self.requires_published.clone(),
            follows_parent: self.follows_parent.clone(),
        }
    }
}

impl<O> std::fmt::Debug for DependencyConfig<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyConfig")
            .field("requires_published", &self.requires_published)
            .field("follows_parent", &self.follows_parent)
            .finish()
    }
}

/// Handle returned by registration, proving the type has a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey(ObjectType);

impl ModelKey {
    pub fn object_type(&self) -> &ObjectType {
        &self.0
    }
}

/// Collects configurations at startup.
pub struct RegistryBuilder<O> {
    configs: BTreeMap<ObjectType, DependencyConfig<O>>,
}

impl<O> RegistryBuilder<O> {
    pub fn new() -> Self {
        Self {
            configs: BTreeMap::new(),
        }
    }

    /// Register the configuration for `object_type`.
    ///
    /// # Errors
    ///
    /// [`PublicationError::DuplicateRegistration`] if the type already has one.
    pub fn register(
        &mut self,
        object_type: ObjectType,
        config: DependencyConfig<O>,
    ) -> Result<ModelKey, PublicationError> {
        if self.configs.contains_key(&object_type) {
            return Err(PublicationError::DuplicateRegistration(object_type));
        }
        tracing::debug!(
            object_type = %object_type,
            requires_published = config.requires_published.len(),
            follows_parent = config.follows_parent.len(),
            "registered dependency configuration"
        );
        self.configs.insert(object_type.clone(), config);
        Ok(ModelKey(object_type))
    }

    /// Freeze the registry.
    pub fn build(self) -> DependencyRegistry<O> {
        DependencyRegistry {
            configs: self.configs,
        }
    }
}

impl<O> Default for RegistryBuilder<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable per-type dependency configuration.
pub struct DependencyRegistry<O> {
    configs: BTreeMap<ObjectType, DependencyConfig<O>>,
}

impl<O> DependencyRegistry<O> {
    /// A registry with no entries; every check and cascade is a no-op.
    pub fn empty() -> Self {
        Self {
            configs: BTreeMap::new(),
        }
    }

    pub fn builder() -> RegistryBuilder<O> {
        RegistryBuilder::new()
    }

    /// Configuration for a type, if one was registered.
    pub fn get(&self, object_type: &ObjectType) -> Option<&DependencyConfig<O>> {
        self.configs.get(object_type)
    }

    /// Configuration behind a registration handle.
    pub fn config(&self, key: &ModelKey) -> Option<&DependencyConfig<O>> {
        self.configs.get(&key.0)
    }

    /// Registered types in sorted order.
    pub fn object_types(&self) -> impl Iterator<Item = &ObjectType> {
        self.configs.keys()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl<O> std::fmt::Debug for DependencyRegistry<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.configs.iter()).finish()
    }
}
