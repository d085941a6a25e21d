//! # opsdesk-state — Approval Workflow State Machines
//!
//! Governs the status of entities with an approval workflow and decides
//! who may move them where.
//!
//! ## State Machines
//!
//! - **Reservation** (`reservation.rs`): `PENDING → APPROVED | REJECTED`,
//!   `APPROVED → FINALIZED`. Rejection carries a mandatory reason.
//!
//! - **Appointment** (`appointment.rs`): `SCHEDULED → ATTENDED | ABSENT |
//!   CANCELLED`, all terminal.
//!
//! ## Design
//!
//! Each family is a closed status enum plus a static transition table of
//! `(from, to) → action, allowed roles`. The generic engine in
//! `workflow.rs` is the only place transitions are checked; there are no
//! string comparisons on status names anywhere else.
//!
//! The engine works on the caller's local copy of an entity and never
//! mutates it: a successful check returns the next version, a failed one
//! returns a [`TransitionRejected`] and leaves the original untouched. The
//! backend remains the system of record; `request.rs` describes the call that
//! follows a successful check.
//!
//! Cross-entity constraints (overlapping reservations of one resource) are
//! the backend's responsibility.

pub mod appointment;
pub mod error;
mod reference;
pub mod request;
pub mod reservation;
pub mod workflow;

pub use appointment::{
    parse_visit_date, parse_visit_time, Appointment, AppointmentDraft, AppointmentStatus,
};
pub use error::{TransitionRejected, WorkflowError};
pub use request::{
    list_request, plan_create, plan_transition, plan_withdrawal, MutationRequest, Method,
    StatusChange,
};
pub use reservation::{finalize_elapsed, Reservation, ReservationDraft, ReservationStatus};
pub use workflow::{
    allowed_actions, attempt_transition, attempt_transition_as, attempt_withdrawal, can_create,
    Action, AllowedAction, EntityDraft, TransitionRule, WorkflowEntity, WorkflowStatus,
};
