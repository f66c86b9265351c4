//! # brit-core — Foundational Types for BRIT Object Management
//!
//! Every crate in the workspace depends on `brit-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ObjectId` and `UserId` are
//!    validated at construction. An owner id cannot be passed where an
//!    object id is expected.
//!
//! 2. **Typed model keys.** `ObjectType` replaces the `(app_label, model_name)`
//!    string pair. Permission codenames are derived from it in one place.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision, so
//!    `submitted_at` / `approved_at` values compare and serialize identically
//!    everywhere.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `brit-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod model;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{ObjectId, UserId, DEFAULT_OWNER_ID};
pub use model::{ObjectRef, ObjectType};
pub use temporal::Timestamp;
