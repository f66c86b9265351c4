//! # Acting User
//!
//! The policy engine needs three things from the identity layer: whether
//! the user is authenticated (and who they are), whether they are staff,
//! and whether they hold a given permission codename. Permission lookups
//! may hit a backend and can fail; the engine treats failure as "no".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use brit_core::UserId;

use crate::error::PolicyError;

/// Identity collaborator contract.
pub trait Identity {
    /// The user's id; `None` for anonymous users.
    fn user_id(&self) -> Option<&UserId>;

    fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    /// Global moderator flag.
    fn is_staff(&self) -> bool;

    /// Whether the user holds `codename` (e.g. `materials.add_sample`).
    fn has_permission(&self, codename: &str) -> Result<bool, PolicyError>;
}

/// A user with statically known grants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// `None` for the anonymous user.
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub is_staff: bool,
    /// Held permission codenames.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl User {
    /// The anonymous user: unauthenticated, no grants.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated user without grants.
    pub fn new(id: UserId) -> Self {
        Self {
            id: Some(id),
            is_staff: false,
            permissions: BTreeSet::new(),
        }
    }

    /// An authenticated staff user.
    pub fn staff(id: UserId) -> Self {
        Self {
            is_staff: true,
            ..Self::new(id)
        }
    }

    /// Add a permission grant.
    pub fn with_permission(mut self, codename: impl Into<String>) -> Self {
        self.permissions.insert(codename.into());
        self
    }
}

impl Identity for User {
    fn user_id(&self) -> Option<&UserId> {
        self.id.as_ref()
    }

    fn is_staff(&self) -> bool {
        self.is_staff
    }

    fn has_permission(&self, codename: &str) -> Result<bool, PolicyError> {
        Ok(self.permissions.contains(codename))
    }
}
