//! # Workflow Errors
//!
//! - [`TransitionRejected`] — an expected outcome: the requested status
//!   change is not legal for this entity and actor. The entity is unchanged
//!   and the screen shows the message inline.
//! - [`WorkflowError`] — an entity or draft violates its own invariants.

use opsdesk_core::{Role, Timestamp, ValidationError};
use thiserror::Error;

use crate::workflow::Action;

/// A status change refused by the workflow engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionRejected {
    /// The current state has no transition to the requested target.
    #[error("invalid transition: {from} -> {to}")]
    InvalidState {
        /// Current status.
        from: String,
        /// Requested status, or `WITHDRAWN` for a withdrawal.
        to: String,
    },

    /// None of the actor's roles may perform the action.
    #[error("roles {roles:?} may not {action} from {from}")]
    Forbidden {
        /// Roles the actor presented.
        roles: Vec<Role>,
        /// The attempted action.
        action: Action,
        /// Current status.
        from: String,
    },

    /// The target requires a non-blank reason.
    #[error("moving to {to} requires a reason")]
    MissingReason {
        /// Requested status.
        to: String,
    },

    /// A reason was attached to a target that does not carry one.
    #[error("moving to {to} does not accept a reason")]
    UnexpectedReason {
        /// Requested status.
        to: String,
    },
}

/// An entity or draft violates a workflow invariant.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// `start < end` does not hold.
    #[error("time range must satisfy start < end (start {starts_at}, end {ends_at})")]
    InvalidTimeRange {
        /// Start of the range.
        starts_at: Timestamp,
        /// End of the range.
        ends_at: Timestamp,
    },

    /// A non-rejected entity carries a rejection reason.
    #[error("rejection reason present on {status} entity")]
    UnexpectedRejectionReason {
        /// The entity status.
        status: String,
    },

    /// A rejected entity has no rejection reason.
    #[error("rejected entity lacks a rejection reason")]
    MissingRejectionReason,

    /// A required text field is blank.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Field name.
        field: &'static str,
    },

    /// None of the actor's roles may create entities of this family.
    #[error("roles {roles:?} may not create {collection}")]
    CreationForbidden {
        /// Roles the actor presented.
        roles: Vec<Role>,
        /// Target collection.
        collection: &'static str,
    },

    /// A date or time field could not be read.
    #[error("invalid {field}: {value:?}")]
    InvalidSchedule {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A core type rejected a value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A request body could not be encoded.
    #[error("request encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
