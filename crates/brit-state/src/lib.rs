//! # brit-state — Publication Status State Machine
//!
//! Every reviewable object carries a [`ReviewState`]: its
//! [`PublicationStatus`] plus the `submitted_at` / `approved_at` /
//! `approved_by` stamps that must stay consistent with it.
//!
//! ## States
//!
//! ```text
//!            submit_for_review            approve
//! Private ─────────────────────▶ Review ─────────▶ Published ──▶ Archived
//!    ▲                          │  │  ▲                     archive
//!    │   withdraw_from_review   │  │  │ submit_for_review
//!    └──────────────────────────┘  │  │
//!    ▲                      reject ▼  │
//!    └──────────────────────── Declined
//!         withdraw_from_review
//! ```
//!
//! ## Design
//!
//! The status is a plain enum with validated transitions rather than a
//! typestate: objects are loaded from storage in any state and the caller
//! only learns the state at runtime. Each transition checks its
//! precondition before touching any field, so a rejected transition leaves
//! the object exactly as it was.
//!
//! Cascades need to move related objects to a status that may not be one
//! single-step transition away; [`ReviewState::force_status`] applies the
//! same stamp rules without the precondition.

pub mod record;
pub mod repair;
pub mod review;
pub mod status;

pub use record::{ObjectCapabilities, RelatedItem, RelationValue, Reviewable, ReviewableRecord};
pub use repair::{plan_repair, repair_review_state, RepairAction};
pub use review::{ReviewState, StatusTransitionRecord, TransitionError};
pub use status::PublicationStatus;
