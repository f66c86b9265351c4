//! # Policy Computation
//!
//! [`compute_policy`] derives every capability flag for a (user, object)
//! pair in a fixed order; later flags build on earlier ones.
//!
//! 1. identity: `is_authenticated`, `is_staff`, `is_owner`
//! 2. status: exactly one of `is_private` .. `is_archived`
//! 3. `is_moderator`: staff, or the per-type `can_moderate_<model>` grant
//! 4. workflow: submit, withdraw, approve, reject (four-eyes)
//! 5. mutation: edit, delete, archive
//! 6. creation: duplicate, new version
//! 7. export and its scope
//! 8. review feedback and visibility
//!
//! Flags that depend on a collaborator query are computed as
//! `Result<bool, PolicyError>` and collapsed at the boundary: `false`,
//! except `is_moderator` which falls back to `is_staff`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use brit_state::{PublicationStatus, Reviewable};

use crate::error::PolicyError;
use crate::identity::Identity;

/// Which objects an export may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    /// Only published (or archived) data.
    Published,
    /// The user's own unpublished data.
    Private,
}

/// Capability flags for one user on one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub is_authenticated: bool,
    pub is_staff: bool,
    pub is_owner: bool,
    pub is_moderator: bool,

    pub is_private: bool,
    pub is_in_review: bool,
    pub is_published: bool,
    pub is_declined: bool,
    pub is_archived: bool,

    pub can_view: bool,
    pub can_submit_review: bool,
    pub can_withdraw_review: bool,
    pub can_approve: bool,
    pub can_reject: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_archive: bool,
    pub can_duplicate: bool,
    pub can_new_version: bool,
    pub can_export: bool,
    pub export_scope: Option<ExportScope>,
    pub can_view_review_feedback: bool,
}

impl PolicyResult {
    /// All boolean flags by name, in sorted order.
    pub fn flags(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("is_authenticated", self.is_authenticated),
            ("is_staff", self.is_staff),
            ("is_owner", self.is_owner),
            ("is_moderator", self.is_moderator),
            ("is_private", self.is_private),
            ("is_in_review", self.is_in_review),
            ("is_published", self.is_published),
            ("is_declined", self.is_declined),
            ("is_archived", self.is_archived),
            ("can_view", self.can_view),
            ("can_submit_review", self.can_submit_review),
            ("can_withdraw_review", self.can_withdraw_review),
            ("can_approve", self.can_approve),
            ("can_reject", self.can_reject),
            ("can_edit", self.can_edit),
            ("can_delete", self.can_delete),
            ("can_archive", self.can_archive),
            ("can_duplicate", self.can_duplicate),
            ("can_new_version", self.can_new_version),
            ("can_export", self.can_export),
            ("can_view_review_feedback", self.can_view_review_feedback),
        ])
    }

    /// Whether any flag that would change the object is set.
    pub fn allows_mutation(&self) -> bool {
        self.can_submit_review
            || self.can_withdraw_review
            || self.can_approve
            || self.can_reject
            || self.can_edit
            || self.can_delete
            || self.can_archive
            || self.can_new_version
    }
}

fn fail_closed(flag: &'static str, result: Result<bool, PolicyError>, fallback: bool) -> bool {
    result.unwrap_or_else(|error| {
        tracing::warn!(flag, %error, fallback, "policy flag could not be derived; failing closed");
        fallback
    })
}

fn holds<U: Identity + ?Sized>(user: &U, codename: &str) -> Result<bool, PolicyError> {
    if !user.is_authenticated() {
        return Ok(false);
    }
    user.has_permission(codename)
}

/// Compute every capability flag for `user` on `object`.
///
/// `review_mode` is set by dedicated review screens and suppresses
/// `can_view_review_feedback` there. Never fails and never panics on
/// collaborator errors.
pub fn compute_policy<U, O>(user: &U, object: &O, review_mode: bool) -> PolicyResult
where
    U: Identity + ?Sized,
    O: Reviewable + ?Sized,
{
    let object_type = object.object_ref().object_type;
    let capabilities = object.capabilities();

    let is_authenticated = user.is_authenticated();
    let is_staff = is_authenticated && user.is_staff();
    let is_owner = is_authenticated && user.user_id() == Some(object.owner());
    let owner_or_staff = is_owner || is_staff;

    let status = object.status();
    let is_private = status == PublicationStatus::Private;
    let is_in_review = status == PublicationStatus::Review;
    let is_published = status == PublicationStatus::Published;
    let is_declined = status == PublicationStatus::Declined;
    let is_archived = status == PublicationStatus::Archived;

    let is_moderator = fail_closed(
        "is_moderator",
        holds(user, &object_type.moderate_permission()).map(|grant| is_staff || grant),
        is_staff,
    );

    let can_submit_review = owner_or_staff && (is_private || is_declined);
    let can_withdraw_review = owner_or_staff && (is_in_review || is_declined);
    let can_approve = is_moderator && is_in_review && !is_owner;
    let can_reject = can_approve;

    let can_edit =
        capabilities.update && !is_archived && (is_staff || (is_owner && !is_published));
    let can_delete = capabilities.delete
        && if is_archived || is_published {
            is_staff
        } else {
            owner_or_staff
        };
    let can_archive = is_published && !is_archived && (owner_or_staff || is_moderator);

    let can_duplicate = fail_closed(
        "can_duplicate",
        holds(user, &object_type.add_permission()),
        false,
    );
    let can_new_version = can_duplicate && owner_or_staff && is_published && !is_archived;

    let is_public = is_published || is_archived;
    let can_export = is_public || (is_authenticated && owner_or_staff);
    let export_scope = if is_public {
        Some(ExportScope::Published)
    } else if owner_or_staff {
        Some(ExportScope::Private)
    } else {
        None
    };

    let can_view_review_feedback = is_owner && is_declined && !review_mode;
    let can_view = is_public || owner_or_staff || (is_moderator && is_in_review);

    PolicyResult {
        is_authenticated,
        is_staff,
        is_owner,
        is_moderator,
        is_private,
        is_in_review,
        is_published,
        is_declined,
        is_archived,
        can_view,
        can_submit_review,
        can_withdraw_review,
        can_approve,
        can_reject,
        can_edit,
        can_delete,
        can_archive,
        can_duplicate,
        can_new_version,
        can_export,
        export_scope,
        can_view_review_feedback,
    }
}
