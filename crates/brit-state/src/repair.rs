//! # Status Drift Repair
//!
//! Stored rows can drift out of the stamp invariants when they are edited
//! outside the transition methods (fixtures, bulk imports, manual SQL).
//! [`plan_repair`] lists the fixes a row needs; [`repair_review_state`]
//! applies them.
//!
//! Invariants restored:
//! - `review` has a `submitted_at`.
//! - `published` has an `approved_at` (falling back to `submitted_at`).
//! - only `published` carries approval stamps.
//! - `private` and `declined` carry no `submitted_at`.

use serde::{Deserialize, Serialize};

use brit_core::Timestamp;

use crate::review::ReviewState;
use crate::status::PublicationStatus;

/// One fix applied to a drifted review state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RepairAction {
    /// A `review` row had no submission time.
    SetSubmittedAt { at: Timestamp },
    /// A `published` row had no approval time.
    SetApprovedAt { at: Timestamp },
    /// A non-published row still carried approval stamps.
    ClearApproval,
    /// A `private` or `declined` row still carried a submission time.
    ClearSubmittedAt,
}

impl std::fmt::Display for RepairAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetSubmittedAt { at } => write!(f, "set submitted_at = {at}"),
            Self::SetApprovedAt { at } => write!(f, "set approved_at = {at}"),
            Self::ClearApproval => f.write_str("clear approved_at/approved_by"),
            Self::ClearSubmittedAt => f.write_str("clear submitted_at"),
        }
    }
}

/// List the repairs `state` needs, without applying them.
pub fn plan_repair(state: &ReviewState, now: Timestamp) -> Vec<RepairAction> {
    let mut actions = Vec::new();
    let status = state.status();
    let has_approval = state.approved_at().is_some() || state.approved_by().is_some();

    match status {
        PublicationStatus::Review if state.submitted_at().is_none() => {
            actions.push(RepairAction::SetSubmittedAt { at: now });
        }
        PublicationStatus::Published if state.approved_at().is_none() => {
            let at = state.submitted_at().unwrap_or(now);
            actions.push(RepairAction::SetApprovedAt { at });
        }
        _ => {}
    }

    if status != PublicationStatus::Published && has_approval {
        actions.push(RepairAction::ClearApproval);
    }

    if matches!(status, PublicationStatus::Private | PublicationStatus::Declined)
        && state.submitted_at().is_some()
    {
        actions.push(RepairAction::ClearSubmittedAt);
    }

    actions
}

/// Restore the stamp invariants on `state`. Returns the repairs applied.
pub fn repair_review_state(state: &mut ReviewState, now: Timestamp) -> Vec<RepairAction> {
    let actions = plan_repair(state, now);
    for action in &actions {
        match action {
            RepairAction::SetSubmittedAt { at } => state.set_submitted_at(Some(*at)),
            RepairAction::SetApprovedAt { at } => state.set_approved_at(Some(*at)),
            RepairAction::ClearApproval => state.clear_approval(),
            RepairAction::ClearSubmittedAt => state.set_submitted_at(None),
        }
    }
    actions
}
