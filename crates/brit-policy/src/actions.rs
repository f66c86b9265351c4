//! # Guarded Workflow Actions
//!
//! The five review transitions as callers should run them: check the
//! policy, gate approval on the prepublish check, transition, then cascade
//! the new status to `follows_parent` relations. The whole sequence runs
//! in one [`ObjectStore::atomic`] block.

use serde::Serialize;

use brit_core::ObjectRef;
use brit_publication::{
    cascade_publication_status, prepublish_check, CascadeOutcome, DependencyRegistry, ObjectStore,
};
use brit_state::{PublicationStatus, Reviewable};

use crate::engine::{compute_policy, PolicyResult};
use crate::error::ActionError;
use crate::identity::Identity;

/// A user-initiated review transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowAction {
    Submit,
    Withdraw,
    Approve,
    Reject,
    Archive,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 5] = [
        Self::Submit,
        Self::Withdraw,
        Self::Approve,
        Self::Reject,
        Self::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Withdraw => "withdraw",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Archive => "archive",
        }
    }

    /// Status the object ends in after the action succeeds.
    pub fn target_status(&self) -> PublicationStatus {
        match self {
            Self::Submit => PublicationStatus::Review,
            Self::Withdraw => PublicationStatus::Private,
            Self::Approve => PublicationStatus::Published,
            Self::Reject => PublicationStatus::Declined,
            Self::Archive => PublicationStatus::Archived,
        }
    }

    /// The policy flag that grants this action.
    pub fn permitted(&self, policy: &PolicyResult) -> bool {
        match self {
            Self::Submit => policy.can_submit_review,
            Self::Withdraw => policy.can_withdraw_review,
            Self::Approve => policy.can_approve,
            Self::Reject => policy.can_reject,
            Self::Archive => policy.can_archive,
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub action: WorkflowAction,
    pub object: ObjectRef,
    /// Status of the object after the action.
    pub status: PublicationStatus,
    pub cascade: CascadeOutcome,
}

fn denial_reason(
    action: WorkflowAction,
    status: PublicationStatus,
    policy: &PolicyResult,
) -> String {
    if !policy.is_authenticated {
        return "authentication required".to_string();
    }
    let owner_or_staff = policy.is_owner || policy.is_staff;
    match action {
        WorkflowAction::Approve | WorkflowAction::Reject => {
            if !policy.is_moderator {
                "moderation permission required".to_string()
            } else if policy.is_owner {
                "owners cannot review their own objects".to_string()
            } else {
                format!("object is {status}, not in review")
            }
        }
        WorkflowAction::Archive if !(owner_or_staff || policy.is_moderator) => {
            "only the owner, staff, or a moderator may archive".to_string()
        }
        WorkflowAction::Submit | WorkflowAction::Withdraw if !owner_or_staff => {
            "only the owner or staff may change review status".to_string()
        }
        _ => format!("not allowed while object is {status}"),
    }
}

/// Run `action` on `target` as `user`.
///
/// # Errors
///
/// - [`ActionError::NotFound`] if the store has no such object.
/// - [`ActionError::PermissionDenied`] if the policy flag for the action
///   is false.
/// - [`ActionError::Blocked`] if approving and the prepublish check finds
///   blocking issues.
/// - Transition, dependency, and store failures.
///
/// On any error the store is left as it was.
pub fn perform<S, U>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    user: &U,
    target: &ObjectRef,
    action: WorkflowAction,
) -> Result<ActionOutcome, ActionError>
where
    S: ObjectStore,
    U: Identity + ?Sized,
{
    store.atomic(|store| {
        let mut object = store
            .load(target)?
            .ok_or_else(|| ActionError::NotFound(target.clone()))?;

        let policy = compute_policy(user, &object, false);
        if !action.permitted(&policy) {
            let reason = denial_reason(action, object.status(), &policy);
            tracing::info!(object = %target, action = %action, %reason, "action refused");
            return Err(ActionError::PermissionDenied {
                action: action.as_str(),
                object: target.clone(),
                reason,
            });
        }

        if action == WorkflowAction::Approve {
            let report =
                prepublish_check(store, registry, &object, Some(PublicationStatus::Published))?;
            if !report.is_ready() {
                tracing::info!(
                    object = %target,
                    blocking = report.blocking.len(),
                    "approval blocked"
                );
                return Err(ActionError::Blocked(Box::new(report)));
            }
        }

        match action {
            WorkflowAction::Submit => object.submit_for_review()?,
            WorkflowAction::Withdraw => object.withdraw_from_review()?,
            WorkflowAction::Approve => {
                let Some(by) = user.user_id() else {
                    return Err(ActionError::PermissionDenied {
                        action: action.as_str(),
                        object: target.clone(),
                        reason: "authentication required".to_string(),
                    });
                };
                object.approve(by)?
            }
            WorkflowAction::Reject => object.reject()?,
            WorkflowAction::Archive => object.archive()?,
        }
        store.save(&object)?;

        let status = object.status();
        let cascade = cascade_publication_status(store, registry, &object, status, user.user_id())?;
        tracing::info!(
            object = %target,
            action = %action,
            status = %status,
            cascaded = cascade.changed.len(),
            "action applied"
        );
        Ok(ActionOutcome {
            action,
            object: target.clone(),
            status,
            cascade,
        })
    })
}

/// Submit `target` for review.
pub fn submit<S, U>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    user: &U,
    target: &ObjectRef,
) -> Result<ActionOutcome, ActionError>
where
    S: ObjectStore,
    U: Identity + ?Sized,
{
    perform(store, registry, user, target, WorkflowAction::Submit)
}

/// Withdraw `target` back to private.
pub fn withdraw<S, U>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    user: &U,
    target: &ObjectRef,
) -> Result<ActionOutcome, ActionError>
where
    S: ObjectStore,
    U: Identity + ?Sized,
{
    perform(store, registry, user, target, WorkflowAction::Withdraw)
}

/// Approve `target`, publishing it and its followers.
pub fn approve<S, U>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    user: &U,
    target: &ObjectRef,
) -> Result<ActionOutcome, ActionError>
where
    S: ObjectStore,
    U: Identity + ?Sized,
{
    perform(store, registry, user, target, WorkflowAction::Approve)
}

pub fn reject<S, U>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    user: &U,
    target: &ObjectRef,
) -> Result<ActionOutcome, ActionError>
where
    S: ObjectStore,
    U: Identity + ?Sized,
{
    perform(store, registry, user, target, WorkflowAction::Reject)
}

pub fn archive<S, U>(
    store: &mut S,
    registry: &DependencyRegistry<S::Object>,
    user: &U,
    target: &ObjectRef,
) -> Result<ActionOutcome, ActionError>
where
    S: ObjectStore,
    U: Identity + ?Sized,
{
    perform(store, registry, user, target, WorkflowAction::Archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::User;
    use brit_core::{ObjectId, ObjectType, UserId};
    use brit_publication::{DependencyConfig, InMemoryStore, RegistryBuilder, RelationRule};
    use brit_state::{ReviewState, ReviewableRecord};

    fn t(s: &str) -> ObjectType {
        ObjectType::parse(s).unwrap()
    }

    fn uid(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn rec(ty: &str, id: &str, status: PublicationStatus) -> ReviewableRecord {
        let mut r = ReviewableRecord::new(t(ty), ObjectId::new(id).unwrap(), uid("owner"), id);
        r.review = ReviewState::from_parts(status, None, None, None);
        r
    }

    fn registry() -> DependencyRegistry<ReviewableRecord> {
        let mut b = RegistryBuilder::new();
        b.register(
            t("soilcom.collection"),
            DependencyConfig::new()
                .requires(RelationRule::slot("catchment", "Catchment", false))
                .follows(RelationRule::slot("properties", "Property values", true)),
        )
        .unwrap();
        b.build()
    }

    fn moderator() -> User {
        User::new(uid("mod")).with_permission("soilcom.can_moderate_collection")
    }

    fn fixture(
        catchment: PublicationStatus,
    ) -> (InMemoryStore<ReviewableRecord>, ObjectRef, ObjectRef) {
        let catchment = rec("maps.catchment", "k1", catchment);
        let prop = rec("soilcom.property_value", "p1", PublicationStatus::Review);
        let collection = rec("soilcom.collection", "c1", PublicationStatus::Review)
            .with_reference("catchment", catchment.object_ref())
            .with_references("properties", [prop.object_ref()]);
        let c_ref = collection.object_ref();
        let p_ref = prop.object_ref();
        (InMemoryStore::from_objects([catchment, prop, collection]), c_ref, p_ref)
    }

    #[test]
    fn approve_publishes_and_cascades() {
        let (mut store, c, p) = fixture(PublicationStatus::Published);
        let out = approve(&mut store, &registry(), &moderator(), &c).unwrap();
        assert_eq!(out.status, PublicationStatus::Published);
        assert_eq!(out.cascade.changed, vec![p.clone()]);
        let collection = store.get(&c).unwrap();
        assert_eq!(collection.review.approved_by(), Some(&uid("mod")));
        let prop = store.get(&p).unwrap();
        assert_eq!(prop.status(), PublicationStatus::Published);
        assert_eq!(prop.review.approved_by(), Some(&uid("mod")));
    }

    #[test]
    fn owner_cannot_approve_own_object() {
        let (mut store, c, _) = fixture(PublicationStatus::Published);
        let owner_mod = User::staff(uid("owner"));
        let err = approve(&mut store, &registry(), &owner_mod, &c).unwrap_err();
        match err {
            ActionError::PermissionDenied { action, reason, .. } => {
                assert_eq!(action, "approve");
                assert!(reason.contains("own"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.get(&c).unwrap().status(), PublicationStatus::Review);
    }

    #[test]
    fn blocked_approval_changes_nothing() {
        let (mut store, c, p) = fixture(PublicationStatus::Private);
        let before = store.list();
        let err = approve(&mut store, &registry(), &moderator(), &c).unwrap_err();
        let ActionError::Blocked(report) = err else {
            panic!("expected Blocked");
        };
        assert_eq!(report.blocking.len(), 1);
        assert_eq!(report.blocking[0].reason, "Private");
        assert_eq!(store.list(), before);
        assert_eq!(store.get(&p).unwrap().status(), PublicationStatus::Review);
    }

    #[test]
    fn reject_declines_and_cascades() {
        let (mut store, c, p) = fixture(PublicationStatus::Private);
        let out = reject(&mut store, &registry(), &moderator(), &c).unwrap();
        assert_eq!(out.status, PublicationStatus::Declined);
        assert_eq!(store.get(&p).unwrap().status(), PublicationStatus::Declined);
    }

    #[test]
    fn owner_submit_withdraw_cycle() {
        let (mut store, c, p) = fixture(PublicationStatus::Published);
        let owner = User::new(uid("owner"));
        let out = withdraw(&mut store, &registry(), &owner, &c).unwrap();
        assert_eq!(out.status, PublicationStatus::Private);
        assert_eq!(store.get(&p).unwrap().status(), PublicationStatus::Private);
        let out = submit(&mut store, &registry(), &owner, &c).unwrap();
        assert_eq!(out.status, PublicationStatus::Review);
        assert!(store.get(&c).unwrap().review.submitted_at().is_some());
    }

    #[test]
    fn stranger_is_refused() {
        let (mut store, c, _) = fixture(PublicationStatus::Published);
        let err = withdraw(&mut store, &registry(), &User::new(uid("x")), &c).unwrap_err();
        assert!(matches!(err, ActionError::PermissionDenied { .. }));
        let err = submit(&mut store, &registry(), &User::anonymous(), &c).unwrap_err();
        assert!(err.to_string().contains("authentication required"), "{err}");
    }

    #[test]
    fn archive_after_publish() {
        let (mut store, c, p) = fixture(PublicationStatus::Published);
        approve(&mut store, &registry(), &moderator(), &c).unwrap();
        let out = archive(&mut store, &registry(), &User::new(uid("owner")), &c).unwrap();
        assert_eq!(out.status, PublicationStatus::Archived);
        let collection = store.get(&c).unwrap();
        assert!(collection.review.approved_at().is_none());
        assert_eq!(store.get(&p).unwrap().status(), PublicationStatus::Archived);
    }

    #[test]
    fn missing_object() {
        let (mut store, _, _) = fixture(PublicationStatus::Published);
        let ghost = ObjectRef::new(t("soilcom.collection"), ObjectId::new("nope").unwrap());
        let err = approve(&mut store, &registry(), &moderator(), &ghost).unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
    }

    #[test]
    fn failed_cascade_rolls_back_transition() {
        // No "properties" slot: the follows_parent rule cannot resolve.
        let collection = rec("soilcom.collection", "c1", PublicationStatus::Private)
            .with_empty_relation("catchment");
        let c = collection.object_ref();
        let mut store = InMemoryStore::from_objects([collection]);
        let err = submit(&mut store, &registry(), &User::new(uid("owner")), &c).unwrap_err();
        assert!(matches!(err, ActionError::Publication(_)));
        assert_eq!(store.get(&c).unwrap().status(), PublicationStatus::Private);
    }

    #[test]
    fn action_targets_match_flags() {
        for action in WorkflowAction::ALL {
            let object = rec("a.b", "1", PublicationStatus::Private);
            let mut policy = compute_policy(&User::anonymous(), &object, false);
            assert!(!action.permitted(&policy));
            policy.can_submit_review = true;
            policy.can_withdraw_review = true;
            policy.can_approve = true;
            policy.can_reject = true;
            policy.can_archive = true;
            assert!(action.permitted(&policy));
        }
        assert_eq!(WorkflowAction::Reject.target_status(), PublicationStatus::Declined);
    }
}
