//! # Listing Visibility
//!
//! Narrows object listings to what a user may see. Everything here is a
//! projection of [`compute_policy`]; no rule is restated.

use serde::{Deserialize, Serialize};

use brit_state::Reviewable;

use crate::engine::compute_policy;
use crate::identity::Identity;

/// A listing tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityScope {
    /// Published and archived objects, for everyone.
    Published,
    /// The user's own objects in any status.
    Private,
    /// Objects awaiting review that the user may moderate.
    Review,
}

impl VisibilityScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Private => "private",
            Self::Review => "review",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "published" => Some(Self::Published),
            "private" => Some(Self::Private),
            "review" => Some(Self::Review),
            _ => None,
        }
    }
}

impl std::fmt::Display for VisibilityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `user` may see `object` at all.
pub fn can_view<U, O>(user: &U, object: &O) -> bool
where
    U: Identity + ?Sized,
    O: Reviewable + ?Sized,
{
    compute_policy(user, object, false).can_view
}

/// Keep the objects `user` may see, preserving order.
pub fn filter_visible<'a, U, O, I>(user: &U, objects: I) -> Vec<&'a O>
where
    U: Identity + ?Sized,
    O: Reviewable + 'a,
    I: IntoIterator<Item = &'a O>,
{
    objects
        .into_iter()
        .filter(|object| can_view(user, *object))
        .collect()
}

/// Keep the objects belonging to `scope` for `user`, preserving order.
///
/// The review tab shows only objects the user could approve, so owners
/// never see their own submissions there.
pub fn scoped<'a, U, O, I>(user: &U, objects: I, scope: VisibilityScope) -> Vec<&'a O>
where
    U: Identity + ?Sized,
    O: Reviewable + 'a,
    I: IntoIterator<Item = &'a O>,
{
    objects
        .into_iter()
        .filter(|object| {
            let policy = compute_policy(user, *object, scope == VisibilityScope::Review);
            match scope {
                VisibilityScope::Published => policy.is_published || policy.is_archived,
                VisibilityScope::Private => policy.is_owner,
                VisibilityScope::Review => policy.can_approve,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::User;
    use brit_core::{ObjectId, ObjectType, UserId};
    use brit_state::{PublicationStatus, ReviewState, ReviewableRecord};

    fn uid(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn rec(id: &str, owner: &str, status: PublicationStatus) -> ReviewableRecord {
        let mut r = ReviewableRecord::new(
            ObjectType::parse("materials.sample").unwrap(),
            ObjectId::new(id).unwrap(),
            uid(owner),
            id,
        );
        r.review = ReviewState::from_parts(status, None, None, None);
        r
    }

    fn objects() -> Vec<ReviewableRecord> {
        vec![
            rec("a", "alice", PublicationStatus::Private),
            rec("b", "bob", PublicationStatus::Review),
            rec("c", "bob", PublicationStatus::Published),
            rec("d", "alice", PublicationStatus::Review),
            rec("e", "bob", PublicationStatus::Archived),
            rec("f", "bob", PublicationStatus::Declined),
        ]
    }

    fn ids(v: Vec<&ReviewableRecord>) -> Vec<&str> {
        v.into_iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn anonymous_sees_public_only() {
        let all = objects();
        assert_eq!(ids(filter_visible(&User::anonymous(), &all)), ["c", "e"]);
    }

    #[test]
    fn owner_sees_own_and_public() {
        let all = objects();
        let alice = User::new(uid("alice"));
        assert_eq!(ids(filter_visible(&alice, &all)), ["a", "c", "d", "e"]);
    }

    #[test]
    fn moderator_sees_review_queue() {
        let all = objects();
        let m = User::new(uid("alice")).with_permission("materials.can_moderate_sample");
        assert_eq!(ids(filter_visible(&m, &all)), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn staff_sees_everything() {
        let all = objects();
        assert_eq!(filter_visible(&User::staff(uid("root")), &all).len(), all.len());
    }

    #[test]
    fn scopes() {
        let all = objects();
        let m = User::new(uid("alice")).with_permission("materials.can_moderate_sample");
        assert_eq!(ids(scoped(&m, &all, VisibilityScope::Published)), ["c", "e"]);
        assert_eq!(ids(scoped(&m, &all, VisibilityScope::Private)), ["a", "d"]);
        // alice's own "d" is excluded from her review queue.
        assert_eq!(ids(scoped(&m, &all, VisibilityScope::Review)), ["b"]);
    }

    #[test]
    fn scope_names_round_trip() {
        for s in [VisibilityScope::Published, VisibilityScope::Private, VisibilityScope::Review] {
            assert_eq!(VisibilityScope::from_name(s.as_str()), Some(s));
        }
        assert_eq!(VisibilityScope::from_name("draft"), None);
    }
}
