//! # brit-publication — Dependency-Aware Publication
//!
//! Publishing one object often only makes sense if the objects it points to
//! are published too (a sample needs its material), and some related
//! objects should simply follow their parent through the workflow (a
//! collection's own property values). This crate holds:
//!
//! - **Registry** (`registry.rs`): per-type [`DependencyConfig`]s, built once
//!   at startup through [`RegistryBuilder`]. Each [`RelationRule`] carries a
//!   typed resolver function instead of an attribute name.
//!
//! - **Prepublish** (`prepublish.rs`): a read-only scan that reports
//!   `requires_published` violations as blocking and `follows_parent`
//!   mismatches as needing sync.
//!
//! - **Cascade** (`cascade.rs`): walks `follows_parent` relations and moves
//!   every related object to the target status, visiting each object once.
//!
//! - **Store** (`store.rs`): the persistence contract ([`ObjectStore`]) with
//!   an atomic block, and [`InMemoryStore`].
//!
//! ## Atomicity
//!
//! The cascade writes through the store one object at a time. Callers run
//! it inside [`ObjectStore::atomic`] so a failure part-way leaves no
//! partial cascade behind.

pub mod cascade;
pub mod error;
pub mod prepublish;
pub mod registry;
pub mod store;

pub use cascade::{cascade_publication_status, cascade_with_visited, CascadeOutcome};
pub use error::{PublicationError, StoreError};
pub use prepublish::{prepublish_check, DependencyIssue, PrepublishReport};
pub use registry::{
    DependencyConfig, DependencyRegistry, ModelKey, RegistryBuilder, RelationRule, ResolveError,
};
pub use store::{InMemoryStore, ObjectStore};
