//! # Status Cascade
//!
//! Moves the objects behind an object's `follows_parent` relations to a
//! target status, then continues from each object it changed. Only
//! `follows_parent` edges are walked; `requires_published` relations are
//! gates and are never written.
//!
//! Related objects are moved with [`ReviewState::force_status`], which
//! applies the usual stamp rules without the single-step precondition. A
//! `visited` set of [`ObjectRef`]s guarantees each object is inspected at
//! most once, so cycles in the relation graph terminate.
//!
//! The root object is not written; its own transition is the caller's.
//!
//! [`ReviewState::force_status`]: brit_state::ReviewState::force_status

use std::collections::HashSet;

use serde::Serialize;

use brit_core::{ObjectRef, Timestamp, UserId};
use brit_state::{PublicationStatus, RelatedItem, Reviewable};

use crate::error::PublicationError;
use crate::prepublish::resolve_rule;
use crate::registry::DependencyRegistry;
use crate::store::ObjectStore;

/// What a cascade did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeOutcome {
    /// Status the cascade moved objects to.
    pub target: PublicationStatus,
    /// Objects whose status was changed, in the order they were written.
    pub changed: Vec<ObjectRef>,
    /// Number of distinct objects inspected, the root included.
    pub visited: usize,
}

/// Propagate `target` from `root` along `follows_parent` relations.
///
/// Run inside [`ObjectStore::atomic`] so a failure leaves no partial cascade.
///
/// # Errors
///
/// [`PublicationError::MisconfiguredDependency`] for unresolvable rules and
/// store failures. Unresolvable references and plain values are skipped.
pub fn cascade_publication_status<S>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    root: &S::Object,
    target: PublicationStatus,
    acting_user: Option<&UserId>,
) -> Result<CascadeOutcome, PublicationError>
where
    S: ObjectStore,
{
    let mut visited = HashSet::new();
    cascade_with_visited(store, registry, root, target, acting_user, &mut visited)
}

/// [`cascade_publication_status`] with a caller-owned `visited` set, for
/// cascading from several roots without revisiting shared objects.
pub fn cascade_with_visited<S>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    root: &S::Object,
    target: PublicationStatus,
    acting_user: Option<&UserId>,
    visited: &mut HashSet<ObjectRef>,
) -> Result<CascadeOutcome, PublicationError>
where
    S: ObjectStore,
{
    let before = visited.len();
    visited.insert(root.object_ref());
    let mut outcome = CascadeOutcome {
        target,
        changed: Vec::new(),
        visited: 0,
    };
    let now = Timestamp::now();
    walk(store, registry, root, target, acting_user, now, visited, &mut outcome)?;
    outcome.visited = visited.len() - before;
    tracing::debug!(
        root = %root.object_ref(),
        target = %target,
        changed = outcome.changed.len(),
        visited = outcome.visited,
        "cascade complete"
    );
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn walk<S>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    object: &S::Object,
    target: PublicationStatus,
    acting_user: Option<&UserId>,
    now: Timestamp,
    visited: &mut HashSet<ObjectRef>,
    outcome: &mut CascadeOutcome,
) -> Result<(), PublicationError>
where
    S: ObjectStore,
{
    let object_ref = object.object_ref();
    let Some(config) = registry.get(&object_ref.object_type) else {
        return Ok(());
    };

    for rule in &config.follows_parent {
        for item in resolve_rule(rule, &object_ref.object_type, object)? {
            let RelatedItem::Object(related_ref) = item else {
                continue;
            };
            if !visited.insert(related_ref.clone()) {
                continue;
            }
            let Some(mut related) = store.load(&related_ref)? else {
                tracing::warn!(
                    parent = %object_ref,
                    related = %related_ref,
                    "skipping unresolvable reference in cascade"
                );
                continue;
            };
            if !related
                .review_state_mut()
                .force_status(target, acting_user, now)
            {
                continue;
            }
            store.save(&related)?;
            tracing::debug!(
                parent = %object_ref,
                related = %related_ref,
                target = %target,
                "cascaded status"
            );
            outcome.changed.push(related_ref);
            walk(store, registry, &related, target, acting_user, now, visited, outcome)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DependencyConfig, RegistryBuilder, RelationRule};
    use crate::store::InMemoryStore;
    use brit_core::{ObjectId, ObjectType};
    use brit_state::ReviewableRecord;

    fn t(s: &str) -> ObjectType {
        ObjectType::parse(s).unwrap()
    }

    fn rec(ty: &str, id: &str) -> ReviewableRecord {
        ReviewableRecord::new(t(ty), ObjectId::new(id).unwrap(), UserId::new("u1").unwrap(), id)
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    /// collection -> properties (follows), collection -> material (requires),
    /// property -> collection (follows, forms a cycle).
    fn registry() -> DependencyRegistry<ReviewableRecord> {
        let mut b = RegistryBuilder::new();
        b.register(
            t("soilcom.collection"),
            DependencyConfig::new()
                .requires(RelationRule::slot("material", "Material", true))
                .follows(RelationRule::slot("properties", "Property values", true)),
        )
        .unwrap();
        b.register(
            t("soilcom.property_value"),
            DependencyConfig::new().follows(RelationRule::slot("collection", "Collection", true)),
        )
        .unwrap();
        b.build()
    }

    #[test]
    fn cascade_moves_children() {
        let p1 = rec("soilcom.property_value", "p1").with_empty_relation("collection");
        let p2 = rec("soilcom.property_value", "p2").with_empty_relation("collection");
        let material = rec("materials.material", "m1");
        let collection = rec("soilcom.collection", "c1")
            .with_reference("material", material.object_ref())
            .with_references("properties", [p1.object_ref(), p2.object_ref()]);
        let mut store = InMemoryStore::from_objects([
            p1.clone(),
            p2.clone(),
            material.clone(),
            collection.clone(),
        ]);

        let outcome = cascade_publication_status(
            &mut store,
            &registry(),
            &collection,
            PublicationStatus::Published,
            Some(&user("mod")),
        )
        .unwrap();

        assert_eq!(outcome.changed, vec![p1.object_ref(), p2.object_ref()]);
        for p in [&p1, &p2] {
            let loaded = store.get(&p.object_ref()).unwrap();
            assert_eq!(loaded.status(), PublicationStatus::Published);
            assert_eq!(loaded.review.approved_by(), Some(&user("mod")));
            assert!(loaded.review.approved_at().is_some());
        }
        // requires_published targets are never written.
        assert_eq!(
            store.get(&material.object_ref()).unwrap().status(),
            PublicationStatus::Private
        );
        // The root is not written by the cascade.
        assert_eq!(
            store.get(&collection.object_ref()).unwrap().status(),
            PublicationStatus::Private
        );
    }

    #[test]
    fn cycle_terminates_and_visits_once() {
        let a_ref = rec("soilcom.collection", "a").object_ref();
        let b = rec("soilcom.property_value", "b").with_reference("collection", a_ref.clone());
        let a = rec("soilcom.collection", "a")
            .with_empty_relation("material")
            .with_references("properties", [b.object_ref()]);
        let mut store = InMemoryStore::from_objects([a.clone(), b.clone()]);

        let outcome = cascade_publication_status(
            &mut store,
            &registry(),
            &a,
            PublicationStatus::Review,
            None,
        )
        .unwrap();

        assert_eq!(outcome.changed, vec![b.object_ref()]);
        assert_eq!(outcome.visited, 2);
        assert_eq!(
            store.get(&a_ref).unwrap().status(),
            PublicationStatus::Private,
            "root reached through the cycle is not revisited"
        );
        assert_eq!(store.get(&b.object_ref()).unwrap().status(), PublicationStatus::Review);
    }

    #[test]
    fn second_run_is_noop() {
        let p1 = rec("soilcom.property_value", "p1").with_empty_relation("collection");
        let collection = rec("soilcom.collection", "c1")
            .with_empty_relation("material")
            .with_references("properties", [p1.object_ref()]);
        let mut store = InMemoryStore::from_objects([p1, collection.clone()]);
        let reg = registry();

        cascade_publication_status(&mut store, &reg, &collection, PublicationStatus::Review, None)
            .unwrap();
        let after_first = store.list();
        let second = cascade_publication_status(
            &mut store,
            &reg,
            &collection,
            PublicationStatus::Review,
            None,
        )
        .unwrap();
        assert!(second.changed.is_empty());
        assert_eq!(store.list(), after_first);
    }

    #[test]
    fn dangling_and_plain_values_are_skipped() {
        let ghost = rec("soilcom.property_value", "ghost").object_ref();
        let collection = rec("soilcom.collection", "c1")
            .with_empty_relation("material")
            .with_relation(
                "properties",
                brit_state::RelationValue::Many(vec![
                    RelatedItem::Object(ghost),
                    RelatedItem::Value(serde_json::json!(42)),
                ]),
            );
        let mut store = InMemoryStore::from_objects([collection.clone()]);
        let outcome = cascade_publication_status(
            &mut store,
            &registry(),
            &collection,
            PublicationStatus::Published,
            None,
        )
        .unwrap();
        assert!(outcome.changed.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unregistered_root_is_noop() {
        let other = rec("maps.catchment", "x");
        let mut store = InMemoryStore::from_objects([other.clone()]);
        let outcome = cascade_publication_status(
            &mut store,
            &registry(),
            &other,
            PublicationStatus::Published,
            None,
        )
        .unwrap();
        assert!(outcome.changed.is_empty());
        assert_eq!(outcome.visited, 1);
    }

    #[test]
    fn misconfigured_rule_surfaces_error() {
        let collection = rec("soilcom.collection", "c1");
        let mut store = InMemoryStore::from_objects([collection.clone()]);
        let err = cascade_publication_status(
            &mut store,
            &registry(),
            &collection,
            PublicationStatus::Published,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PublicationError::MisconfiguredDependency { .. }));
    }

    #[test]
    fn shared_visited_set_spans_roots() {
        let p1 = rec("soilcom.property_value", "p1").with_empty_relation("collection");
        let c1 = rec("soilcom.collection", "c1")
            .with_empty_relation("material")
            .with_references("properties", [p1.object_ref()]);
        let c2 = rec("soilcom.collection", "c2")
            .with_empty_relation("material")
            .with_references("properties", [p1.object_ref()]);
        let mut store = InMemoryStore::from_objects([p1.clone(), c1.clone(), c2.clone()]);
        let reg = registry();
        let mut visited = HashSet::new();
        let review = PublicationStatus::Review;
        let first =
            cascade_with_visited(&mut store, &reg, &c1, review, None, &mut visited).unwrap();
        let second =
            cascade_with_visited(&mut store, &reg, &c2, review, None, &mut visited).unwrap();
        assert_eq!(first.changed, vec![p1.object_ref()]);
        assert!(second.changed.is_empty());
        assert_eq!(second.visited, 1);
    }
}
