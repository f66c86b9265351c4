//! # Prepublish Check
//!
//! Read-only readiness scan run before a status transition.
//!
//! - Every `requires_published` relation must be set (unless optional) and
//!   every reviewable object it points to must be published. Violations are
//!   **blocking**.
//! - With a target status, every reviewable object behind a
//!   `follows_parent` relation whose status differs is reported as
//!   **needs sync**. Informational only; the cascade will move it.
//!
//! Plain values in a relation have no status and are skipped. The scan
//! loads related objects from the store but never writes.

use serde::{Deserialize, Serialize};

use brit_core::{ObjectRef, ObjectType};
use brit_state::{PublicationStatus, RelatedItem, Reviewable};

use crate::error::PublicationError;
use crate::registry::{DependencyRegistry, RelationRule};
use crate::store::ObjectStore;

/// Reason given when a required relation is unset or dangling.
pub const MISSING_REFERENCE: &str = "missing reference";

/// One unmet requirement or out-of-sync related object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyIssue {
    /// Accessor of the rule that produced the issue.
    pub accessor: String,
    /// Human-readable relation name.
    pub label: String,
    /// The related object, when the issue concerns one.
    pub related: Option<ObjectRef>,
    /// The related object's status, when it was loaded.
    pub status: Option<PublicationStatus>,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for DependencyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.related {
            Some(related) => write!(f, "{} ({}): {}", self.label, related, self.reason),
            None => write!(f, "{}: {}", self.label, self.reason),
        }
    }
}

/// Result of a prepublish scan. Request-scoped; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepublishReport {
    /// The object that was scanned.
    pub object: ObjectRef,
    /// The status the caller intends to move to, if given.
    pub target: Option<PublicationStatus>,
    /// Violations that must stop the transition.
    pub blocking: Vec<DependencyIssue>,
    /// Related objects the cascade would move.
    pub needs_sync: Vec<DependencyIssue>,
}

impl PrepublishReport {
    fn new(object: ObjectRef, target: Option<PublicationStatus>) -> Self {
        Self {
            object,
            target,
            blocking: Vec::new(),
            needs_sync: Vec::new(),
        }
    }

    /// Whether nothing blocks the transition.
    pub fn is_ready(&self) -> bool {
        self.blocking.is_empty()
    }

    /// Blocking issues rendered as checklist lines.
    pub fn checklist(&self) -> Vec<String> {
        self.blocking.iter().map(ToString::to_string).collect()
    }
}

fn issue<O>(
    rule: &RelationRule<O>,
    related: Option<ObjectRef>,
    status: Option<PublicationStatus>,
    reason: &str,
) -> DependencyIssue {
    DependencyIssue {
        accessor: rule.accessor.clone(),
        label: rule.label.clone(),
        related,
        status,
        reason: reason.to_string(),
    }
}

pub(crate) fn resolve_rule<O>(
    rule: &RelationRule<O>,
    object_type: &ObjectType,
    object: &O,
) -> Result<Vec<RelatedItem>, PublicationError> {
    rule.resolve(object)
        .map_err(|e| PublicationError::MisconfiguredDependency {
            object_type: object_type.clone(),
            accessor: rule.accessor.clone(),
            reason: e.0,
        })
}

/// Scan `object`'s declared dependencies.
///
/// # Errors
///
/// [`PublicationError::MisconfiguredDependency`] when a rule cannot be
/// resolved on the object, and store failures.
pub fn prepublish_check<S>(
    store: &S,
    registry: &DependencyRegistry<S::Object>,
    object: &S::Object,
    target: Option<PublicationStatus>,
) -> Result<PrepublishReport, PublicationError>
where
    S: ObjectStore,
{
    let object_ref = object.object_ref();
    let mut report = PrepublishReport::new(object_ref.clone(), target);
    let Some(config) = registry.get(&object_ref.object_type) else {
        return Ok(report);
    };

    for rule in &config.requires_published {
        let items = resolve_rule(rule, &object_ref.object_type, object)?;
        if items.is_empty() && !rule.optional {
            report.blocking.push(issue(rule, None, None, MISSING_REFERENCE));
            continue;
        }
        for item in items {
            let RelatedItem::Object(related_ref) = item else {
                continue;
            };
            match store.load(&related_ref)? {
                None => {
                    report
                        .blocking
                        .push(issue(rule, Some(related_ref), None, MISSING_REFERENCE));
                }
                Some(related) => {
                    let status = related.status();
                    if status != PublicationStatus::Published {
                        report.blocking.push(issue(
                            rule,
                            Some(related_ref),
                            Some(status),
                            status.label(),
                        ));
                    }
                }
            }
        }
    }

    if let Some(target) = target {
        for rule in &config.follows_parent {
            let items = resolve_rule(rule, &object_ref.object_type, object)?;
            for item in items {
                let RelatedItem::Object(related_ref) = item else {
                    continue;
                };
                let Some(related) = store.load(&related_ref)? else {
                    tracing::warn!(
                        object = %object_ref,
                        related = %related_ref,
                        "follows_parent reference does not resolve"
                    );
                    continue;
                };
                let status = related.status();
                if status != target {
                    report.needs_sync.push(issue(
                        rule,
                        Some(related_ref),
                        Some(status),
                        status.label(),
                    ));
                }
            }
        }
    }

    tracing::debug!(
        object = %object_ref,
        blocking = report.blocking.len(),
        needs_sync = report.needs_sync.len(),
        "prepublish check complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DependencyConfig, RegistryBuilder};
    use crate::store::InMemoryStore;
    use brit_core::{ObjectId, UserId};
    use brit_state::{RelationValue, ReviewableRecord};

    fn t(s: &str) -> ObjectType {
        ObjectType::parse(s).unwrap()
    }

    fn rec(ty: &str, id: &str) -> ReviewableRecord {
        ReviewableRecord::new(t(ty), ObjectId::new(id).unwrap(), UserId::new("u1").unwrap(), id)
    }

    fn publish(mut r: ReviewableRecord) -> ReviewableRecord {
        r.submit_for_review().unwrap();
        r.approve(&UserId::new("mod").unwrap()).unwrap();
        r
    }

    fn registry() -> DependencyRegistry<ReviewableRecord> {
        let mut b = RegistryBuilder::new();
        b.register(
            t("materials.sample"),
            DependencyConfig::new()
                .requires(RelationRule::slot("material", "Material", false))
                .requires(RelationRule::slot("sources", "Sources", true))
                .follows(RelationRule::slot("properties", "Property values", true)),
        )
        .unwrap();
        b.build()
    }

    #[test]
    fn unpublished_material_blocks() {
        let material = rec("materials.material", "m1");
        let sample = rec("materials.sample", "s1")
            .with_reference("material", material.object_ref())
            .with_empty_relation("sources")
            .with_empty_relation("properties");
        let store = InMemoryStore::from_objects([material.clone(), sample.clone()]);

        let target = Some(PublicationStatus::Published);
        let report = prepublish_check(&store, &registry(), &sample, target).unwrap();
        assert!(!report.is_ready());
        assert_eq!(report.blocking.len(), 1);
        let issue = &report.blocking[0];
        assert_eq!(issue.accessor, "material");
        assert_eq!(issue.related, Some(material.object_ref()));
        assert_eq!(issue.status, Some(PublicationStatus::Private));
        assert_eq!(issue.reason, "Private");
    }

    #[test]
    fn published_material_passes() {
        let material = publish(rec("materials.material", "m1"));
        let sample = rec("materials.sample", "s1")
            .with_reference("material", material.object_ref())
            .with_empty_relation("sources")
            .with_empty_relation("properties");
        let store = InMemoryStore::from_objects([material, sample.clone()]);
        let report = prepublish_check(&store, &registry(), &sample, None).unwrap();
        assert!(report.is_ready());
        assert!(report.needs_sync.is_empty());
    }

    #[test]
    fn missing_required_reference_blocks() {
        let sample = rec("materials.sample", "s1")
            .with_empty_relation("material")
            .with_empty_relation("sources")
            .with_empty_relation("properties");
        let store = InMemoryStore::from_objects([sample.clone()]);
        let report = prepublish_check(&store, &registry(), &sample, None).unwrap();
        assert_eq!(report.blocking.len(), 1);
        assert_eq!(report.blocking[0].reason, MISSING_REFERENCE);
        assert_eq!(report.blocking[0].related, None);
        assert_eq!(report.checklist(), vec!["Material: missing reference".to_string()]);
    }

    #[test]
    fn dangling_reference_blocks() {
        let ghost = rec("materials.material", "gone");
        let sample = rec("materials.sample", "s1")
            .with_reference("material", ghost.object_ref())
            .with_empty_relation("sources")
            .with_empty_relation("properties");
        let store = InMemoryStore::from_objects([sample.clone()]);
        let report = prepublish_check(&store, &registry(), &sample, None).unwrap();
        assert_eq!(report.blocking[0].reason, MISSING_REFERENCE);
        assert_eq!(report.blocking[0].related, Some(ghost.object_ref()));
    }

    #[test]
    fn plain_values_are_skipped() {
        let material = publish(rec("materials.material", "m1"));
        let sample = rec("materials.sample", "s1")
            .with_reference("material", material.object_ref())
            .with_relation(
                "sources",
                RelationValue::Many(vec![RelatedItem::Value(serde_json::json!("doi:10.1/x"))]),
            )
            .with_empty_relation("properties");
        let store = InMemoryStore::from_objects([material, sample.clone()]);
        let report = prepublish_check(&store, &registry(), &sample, None).unwrap();
        assert!(report.is_ready());
    }

    #[test]
    fn follows_parent_mismatch_needs_sync() {
        let material = publish(rec("materials.material", "m1"));
        let prop = rec("materials.property", "p1");
        let sample = rec("materials.sample", "s1")
            .with_reference("material", material.object_ref())
            .with_empty_relation("sources")
            .with_references("properties", [prop.object_ref()]);
        let store = InMemoryStore::from_objects([material, prop.clone(), sample.clone()]);

        let target = Some(PublicationStatus::Review);
        let report = prepublish_check(&store, &registry(), &sample, target).unwrap();
        assert!(report.is_ready());
        assert_eq!(report.needs_sync.len(), 1);
        assert_eq!(report.needs_sync[0].related, Some(prop.object_ref()));

        let without_target = prepublish_check(&store, &registry(), &sample, None).unwrap();
        assert!(without_target.needs_sync.is_empty());
    }

    #[test]
    fn misconfigured_accessor_is_an_error() {
        let sample = rec("materials.sample", "s1");
        let store = InMemoryStore::from_objects([sample.clone()]);
        let err = prepublish_check(&store, &registry(), &sample, None).unwrap_err();
        assert!(matches!(
            err,
            PublicationError::MisconfiguredDependency { ref accessor, .. } if accessor == "material"
        ));
    }

    #[test]
    fn unregistered_type_reports_nothing() {
        let other = rec("maps.catchment", "c1");
        let store = InMemoryStore::from_objects([other.clone()]);
        let target = Some(PublicationStatus::Published);
        let report = prepublish_check(&store, &registry(), &other, target).unwrap();
        assert!(report.is_ready());
        assert!(report.needs_sync.is_empty());
    }

    #[test]
    fn check_does_not_mutate() {
        let material = rec("materials.material", "m1");
        let prop = rec("materials.property", "p1");
        let sample = rec("materials.sample", "s1")
            .with_reference("material", material.object_ref())
            .with_empty_relation("sources")
            .with_references("properties", [prop.object_ref()]);
        let store = InMemoryStore::from_objects([material, prop, sample.clone()]);
        let before = store.list();
        let sample_before = sample.clone();
        prepublish_check(&store, &registry(), &sample, Some(PublicationStatus::Published)).unwrap();
        assert_eq!(store.list(), before);
        assert_eq!(sample, sample_before);
    }
}
