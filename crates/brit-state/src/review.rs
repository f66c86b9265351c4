//! # Review State and Transitions
//!
//! [`ReviewState`] holds the status and its stamps. Stamp rules applied on
//! entering each status:
//!
//! | entering    | `submitted_at`   | `approved_at` / `approved_by` |
//! |-------------|------------------|-------------------------------|
//! | `private`   | cleared          | cleared                       |
//! | `review`    | set to now       | cleared                       |
//! | `published` | kept             | set to now / acting user      |
//! | `declined`  | cleared          | cleared                       |
//! | `archived`  | kept             | cleared                       |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use brit_core::{Timestamp, UserId};

use crate::status::PublicationStatus;

/// A transition method was called while its precondition did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The object is not in a state the transition starts from.
    #[error("cannot {action} {object}: status is {from}, expected {expected}")]
    InvalidTransition {
        /// The object the transition was attempted on.
        object: String,
        /// The transition method that was called.
        action: &'static str,
        /// Status at the time of the call.
        from: PublicationStatus,
        /// Human-readable list of accepted starting states.
        expected: String,
    },
}

impl TransitionError {
    /// Attach the object's reference to the error message.
    pub fn for_object(self, object: impl std::fmt::Display) -> Self {
        match self {
            Self::InvalidTransition {
                action,
                from,
                expected,
                ..
            } => Self::InvalidTransition {
                object: object.to_string(),
                action,
                from,
                expected,
            },
        }
    }

    /// Status the object was in when the transition was refused.
    pub fn from_status(&self) -> PublicationStatus {
        match self {
            Self::InvalidTransition { from, .. } => *from,
        }
    }
}

/// One recorded status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransitionRecord {
    /// Status before the change.
    pub from: PublicationStatus,
    /// Status after the change.
    pub to: PublicationStatus,
    /// When the change was applied.
    pub at: Timestamp,
    /// Who caused it, when known.
    pub actor: Option<UserId>,
    /// Whether the change was applied by a cascade from a related object.
    #[serde(default)]
    pub cascaded: bool,
}

/// Publication status of one object plus its review stamps.
///
/// `submit_for_review` and `withdraw_from_review` accept `declined` as well
/// as their nominal source status (`private` and `review`). This
/// deliberately widens the plain private-only submit so that a declined
/// object can be resubmitted or returned to private, matching what the
/// policy engine offers its owner.
///
/// The transition log is kept in memory only. It is never serialized, so a
/// state rebuilt from storage, by deserialization or [`Self::from_parts`],
/// starts with an empty log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    status: PublicationStatus,
    #[serde(default)]
    submitted_at: Option<Timestamp>,
    #[serde(default)]
    approved_at: Option<Timestamp>,
    #[serde(default)]
    approved_by: Option<UserId>,
    #[serde(skip)]
    transitions: Vec<StatusTransitionRecord>,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewState {
    /// A fresh private state with no stamps.
    pub fn new() -> Self {
        Self {
            status: PublicationStatus::Private,
            submitted_at: None,
            approved_at: None,
            approved_by: None,
            transitions: Vec::new(),
        }
    }

    /// Rebuild a state from persisted columns. No consistency checks are
    /// applied; see [`crate::repair`] for restoring invariants on drifted rows.
    pub fn from_parts(
        status: PublicationStatus,
        submitted_at: Option<Timestamp>,
        approved_at: Option<Timestamp>,
        approved_by: Option<UserId>,
    ) -> Self {
        Self {
            status,
            submitted_at,
            approved_at,
            approved_by,
            transitions: Vec::new(),
        }
    }

    pub fn status(&self) -> PublicationStatus {
        self.status
    }

    pub fn submitted_at(&self) -> Option<Timestamp> {
        self.submitted_at
    }

    pub fn approved_at(&self) -> Option<Timestamp> {
        self.approved_at
    }

    pub fn approved_by(&self) -> Option<&UserId> {
        self.approved_by.as_ref()
    }

    /// Ordered log of the status changes applied since this state was
    /// created or loaded.
    pub fn transitions(&self) -> &[StatusTransitionRecord] {
        &self.transitions
    }

    /// PRIVATE | DECLINED → REVIEW.
    pub fn submit_for_review(&mut self) -> Result<(), TransitionError> {
        self.require(
            "submit for review",
            &[PublicationStatus::Private, PublicationStatus::Declined],
        )?;
        self.enter(PublicationStatus::Review, None, Timestamp::now(), false);
        Ok(())
    }

    /// REVIEW | DECLINED → PRIVATE.
    pub fn withdraw_from_review(&mut self) -> Result<(), TransitionError> {
        self.require(
            "withdraw from review",
            &[PublicationStatus::Review, PublicationStatus::Declined],
        )?;
        self.enter(PublicationStatus::Private, None, Timestamp::now(), false);
        Ok(())
    }

    /// REVIEW → PUBLISHED, stamped with the approving user.
    ///
    /// The four-eyes rule is a permission concern and is not checked here.
    pub fn approve(&mut self, by: &UserId) -> Result<(), TransitionError> {
        self.require("approve", &[PublicationStatus::Review])?;
        self.enter(
            PublicationStatus::Published,
            Some(by.clone()),
            Timestamp::now(),
            false,
        );
        Ok(())
    }

    /// REVIEW → DECLINED.
    pub fn reject(&mut self) -> Result<(), TransitionError> {
        self.require("reject", &[PublicationStatus::Review])?;
        self.enter(PublicationStatus::Declined, None, Timestamp::now(), false);
        Ok(())
    }

    /// PUBLISHED → ARCHIVED.
    pub fn archive(&mut self) -> Result<(), TransitionError> {
        self.require("archive", &[PublicationStatus::Published])?;
        self.enter(PublicationStatus::Archived, None, Timestamp::now(), false);
        Ok(())
    }

    /// Move to `target` without a precondition, applying the stamp rules.
    ///
    /// Used by cascades. Returns `false` and changes nothing when the state is
    /// already at `target`.
    pub fn force_status(
        &mut self,
        target: PublicationStatus,
        actor: Option<&UserId>,
        now: Timestamp,
    ) -> bool {
        if self.status == target {
            return false;
        }
        self.enter(target, actor.cloned(), now, true);
        true
    }

    pub(crate) fn set_submitted_at(&mut self, at: Option<Timestamp>) {
        self.submitted_at = at;
    }

    pub(crate) fn set_approved_at(&mut self, at: Option<Timestamp>) {
        self.approved_at = at;
    }

    pub(crate) fn clear_approval(&mut self) {
        self.approved_at = None;
        self.approved_by = None;
    }

    fn require(
        &self,
        action: &'static str,
        allowed: &[PublicationStatus],
    ) -> Result<(), TransitionError> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        let expected = allowed
            .iter()
            .map(PublicationStatus::as_str)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(TransitionError::InvalidTransition {
            object: "object".to_string(),
            action,
            from: self.status,
            expected,
        })
    }

    fn enter(
        &mut self,
        to: PublicationStatus,
        actor: Option<UserId>,
        now: Timestamp,
        cascaded: bool,
    ) {
        match to {
            PublicationStatus::Private | PublicationStatus::Declined => {
                self.submitted_at = None;
                self.clear_approval();
            }
            PublicationStatus::Review => {
                self.submitted_at = Some(now);
                self.clear_approval();
            }
            PublicationStatus::Published => {
                self.approved_at = Some(now);
                self.approved_by = actor.clone();
            }
            PublicationStatus::Archived => {
                self.clear_approval();
            }
        }
        tracing::debug!(from = %self.status, to = %to, cascaded, "publication status changed");
        self.transitions.push(StatusTransitionRecord {
            from: self.status,
            to,
            at: now,
            actor,
            cascaded,
        });
        self.status = to;
    }
}
