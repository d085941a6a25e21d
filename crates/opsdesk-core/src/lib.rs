//! # opsdesk-core — Foundational Types for the Operations Console
//!
//! Leaf crate of the opsdesk workspace. Defines the vocabulary every other
//! crate speaks: which facility a console is deployed for, which roles exist
//! there, how subjects and entities are referenced, and how instants in time
//! are represented.
//!
//! ## Key Design Principles
//!
//! 1. **Closed role enumeration.** [`Role`] has one variant per role known to
//!    any deployment. A [`Deployment`] selects the subset that is meaningful
//!    for a facility and the priority order used to pick a primary role.
//!
//! 2. **Newtype wrappers for references.** [`SubjectId`] and [`EntityRef`]
//!    are validated at construction and at deserialization. No bare strings
//!    for identifiers.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is truncated to seconds and
//!    always rendered with a `Z` suffix.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `opsdesk-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod deployment;
pub mod error;
pub mod identity;
pub mod role;
pub mod temporal;

pub use deployment::Deployment;
pub use error::ValidationError;
pub use identity::{EntityRef, SubjectId};
pub use role::Role;
pub use temporal::Timestamp;
