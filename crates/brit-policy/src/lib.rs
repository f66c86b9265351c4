//! # brit-policy — Object Policy Engine
//!
//! Answers "what may this user do with this object?" for every reviewable
//! object in the system.
//!
//! - **Identity** (`identity.rs`): the [`Identity`] contract for the acting
//!   user and the concrete [`User`].
//!
//! - **Engine** (`engine.rs`): [`compute_policy`] derives a [`PolicyResult`]
//!   of capability flags from identity, ownership, moderation grants, and
//!   publication status. Derivation is total: a flag whose inputs cannot be
//!   determined falls back to its conservative value.
//!
//! - **Visibility** (`visibility.rs`): filtering object listings down to
//!   what a user may see.
//!
//! - **Actions** (`actions.rs`): the five workflow transitions guarded by
//!   the policy, the prepublish gate, and the follows-parent cascade, run as
//!   one atomic store block.
//!
//! ## Four-eyes rule
//!
//! A user never approves or rejects an object they own, whatever their
//! moderation rights. `can_approve` and `can_reject` are false for owners,
//! and [`actions::approve`] / [`actions::reject`] refuse accordingly.

pub mod actions;
pub mod engine;
pub mod error;
pub mod identity;
pub mod visibility;

pub use actions::{perform, ActionOutcome, WorkflowAction};
pub use engine::{compute_policy, ExportScope, PolicyResult};
pub use error::{ActionError, PolicyError};
pub use identity::{Identity, User};
pub use visibility::{can_view, filter_visible, scoped, VisibilityScope};
