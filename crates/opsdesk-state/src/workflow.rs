//! # Workflow Engine
//!
//! Generic transition checking over any entity family that provides a
//! closed status enum and a static transition table.
//!
//! ## Check Order
//!
//! ```text
//! attempt_transition(entity, target, role, reason)
//!   │
//!   ├─ current status terminal ─────────────▶ InvalidState
//!   ├─ no rule for (current, target) ───────▶ InvalidState
//!   ├─ role not in rule.roles ──────────────▶ Forbidden
//!   ├─ target needs reason, none given ─────▶ MissingReason
//!   ├─ target takes no reason, one given ───▶ UnexpectedReason
//!   └─ Ok(next version of entity)
//! ```
//!
//! Blank reasons count as absent. The input entity is borrowed immutably and
//! never changes.

use opsdesk_core::{EntityRef, Role};
use serde::Serialize;
use tracing::debug;

use crate::error::{TransitionRejected, WorkflowError};

// ─── Actions ─────────────────────────────────────────────────────────

/// A user-visible operation on a workflow entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Reservation `PENDING → APPROVED`.
    Approve,
    /// Reservation `PENDING → REJECTED`.
    Reject,
    /// Reservation `APPROVED → FINALIZED`.
    Finalize,
    /// Appointment `SCHEDULED → ATTENDED`.
    MarkAttended,
    /// Appointment `SCHEDULED → ABSENT`.
    MarkAbsent,
    /// Appointment `SCHEDULED → CANCELLED`.
    Cancel,
    /// Requester deletes its own request from the initial state.
    Withdraw,
}

impl Action {
    /// Kebab-case name, as shown in menus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Finalize => "finalize",
            Self::MarkAttended => "mark-attended",
            Self::MarkAbsent => "mark-absent",
            Self::Cancel => "cancel",
            Self::Withdraw => "withdraw",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Traits ──────────────────────────────────────────────────────────

/// One row of a transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule<S> {
    /// Source status.
    pub from: S,
    /// Target status.
    pub to: S,
    /// The action this row represents.
    pub action: Action,
    /// Roles allowed to perform it.
    pub roles: &'static [Role],
}

impl<S> TransitionRule<S> {
    /// Whether any of `roles` is allowed by this row.
    pub fn permits_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }
}

/// A closed status enumeration with a static transition table.
pub trait WorkflowStatus:
    Copy + Eq + std::fmt::Debug + std::fmt::Display + Serialize + 'static
{
    /// Status of a freshly created entity.
    const INITIAL: Self;

    /// Whether no transition leaves this status.
    fn is_terminal(&self) -> bool;

    /// Whether entering this status requires a reason.
    fn requires_reason(&self) -> bool;

    /// Every legal transition of the family.
    fn rules() -> &'static [TransitionRule<Self>];

    /// The rule for `(from, to)`, if any.
    fn rule(from: Self, to: Self) -> Option<&'static TransitionRule<Self>> {
        Self::rules().iter().find(|r| r.from == from && r.to == to)
    }
}

/// An entity governed by a [`WorkflowStatus`].
pub trait WorkflowEntity: Clone {
    /// The status enum of the family.
    type Status: WorkflowStatus;

    /// Backend collection name (`reservations`, `appointments`).
    const COLLECTION: &'static str;

    /// Roles that may withdraw an entity in its initial status. Empty when the
    /// family has no withdrawal.
    const WITHDRAWAL_ROLES: &'static [Role];

    /// Roles that may create entities of this family.
    const CREATION_ROLES: &'static [Role];

    /// Backend identifier.
    fn id(&self) -> &EntityRef;

    /// Current status.
    fn status(&self) -> Self::Status;

    /// Move to `status`. Only the engine calls this, after every check passed;
    /// `reason` is `Some` exactly when `status.requires_reason()`.
    fn enter_status(&mut self, status: Self::Status, reason: Option<String>);
}

/// A creation payload for a workflow entity.
pub trait EntityDraft: Serialize {
    /// The entity family this draft creates.
    type Entity: WorkflowEntity;

    /// Check the draft's own invariants.
    fn validate(&self) -> Result<(), WorkflowError>;
}

// ─── Engine ──────────────────────────────────────────────────────────

fn normalize_reason(reason: Option<&str>) -> Option<&str> {
    reason.map(str::trim).filter(|r| !r.is_empty())
}

/// Check a transition for a single-role actor and return the next version of
/// the entity.
pub fn attempt_transition<E: WorkflowEntity>(
    entity: &E,
    target: E::Status,
    actor: Role,
    reason: Option<&str>,
) -> Result<E, TransitionRejected> {
    attempt_transition_as(entity, target, &[actor], reason)
}

/// Check a transition for an actor holding `roles`; it succeeds when any of
/// them is allowed.
pub fn attempt_transition_as<E: WorkflowEntity>(
    entity: &E,
    target: E::Status,
    roles: &[Role],
    reason: Option<&str>,
) -> Result<E, TransitionRejected> {
    let from = entity.status();
    let invalid = || TransitionRejected::InvalidState {
        from: from.to_string(),
        to: target.to_string(),
    };

    if from.is_terminal() {
        return Err(invalid());
    }
    let rule = E::Status::rule(from, target).ok_or_else(invalid)?;
    if !rule.permits_any(roles) {
        return Err(TransitionRejected::Forbidden {
            roles: roles.to_vec(),
            action: rule.action,
            from: from.to_string(),
        });
    }

    let reason = normalize_reason(reason);
    match (target.requires_reason(), reason) {
        (true, None) => {
            return Err(TransitionRejected::MissingReason {
                to: target.to_string(),
            })
        }
        (false, Some(_)) => {
            return Err(TransitionRejected::UnexpectedReason {
                to: target.to_string(),
            })
        }
        _ => {}
    }

    let mut next = entity.clone();
    next.enter_status(target, reason.map(str::to_owned));
    debug!(
        collection = E::COLLECTION,
        id = %entity.id(),
        %from,
        to = %target,
        action = %rule.action,
        "transition accepted"
    );
    Ok(next)
}

/// Check that an actor holding `roles` may withdraw (delete) `entity`.
pub fn attempt_withdrawal<E: WorkflowEntity>(
    entity: &E,
    roles: &[Role],
) -> Result<(), TransitionRejected> {
    let from = entity.status();
    if from != E::Status::INITIAL || E::WITHDRAWAL_ROLES.is_empty() {
        return Err(TransitionRejected::InvalidState {
            from: from.to_string(),
            to: "WITHDRAWN".to_string(),
        });
    }
    if !roles.iter().any(|r| E::WITHDRAWAL_ROLES.contains(r)) {
        return Err(TransitionRejected::Forbidden {
            roles: roles.to_vec(),
            action: Action::Withdraw,
            from: from.to_string(),
        });
    }
    debug!(collection = E::COLLECTION, id = %entity.id(), "withdrawal accepted");
    Ok(())
}

/// Whether an actor holding `roles` may create entities of family `E`.
pub fn can_create<E: WorkflowEntity>(roles: &[Role]) -> bool {
    roles.iter().any(|r| E::CREATION_ROLES.contains(r))
}

/// An action offered to the current actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllowedAction<S> {
    /// The action.
    pub action: Action,
    /// Target status; `None` for a withdrawal.
    pub target: Option<S>,
    /// Whether the action needs a reason.
    pub requires_reason: bool,
}

/// Every action on `entity` that some role in `roles` may perform.
///
/// Agrees with [`attempt_transition_as`] and [`attempt_withdrawal`]: an
/// action is listed exactly when the matching call (with a reason where one
/// is required) would succeed.
pub fn allowed_actions<E: WorkflowEntity>(
    entity: &E,
    roles: &[Role],
) -> Vec<AllowedAction<E::Status>> {
    let from = entity.status();
    if from.is_terminal() {
        return Vec::new();
    }

    let mut actions: Vec<_> = E::Status::rules()
        .iter()
        .filter(|rule| rule.from == from && rule.permits_any(roles))
        .map(|rule| AllowedAction {
            action: rule.action,
            target: Some(rule.to),
            requires_reason: rule.to.requires_reason(),
        })
        .collect();

    if attempt_withdrawal(entity, roles).is_ok() {
        actions.push(AllowedAction {
            action: Action::Withdraw,
            target: None,
            requires_reason: false,
        });
    }
    actions
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::appointment::{Appointment, AppointmentStatus};
    use crate::reservation::{Reservation, ReservationStatus};
    use proptest::prelude::*;

    fn roles() -> impl Strategy<Value = Vec<Role>> {
        prop::collection::vec(prop::sample::select(Role::ALL.to_vec()), 0..4)
    }

    fn reason() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[ a-z]{0,12}")
    }

    fn reservation_status() -> impl Strategy<Value = ReservationStatus> {
        prop::sample::select(ReservationStatus::ALL.to_vec())
    }

    fn appointment_status() -> impl Strategy<Value = AppointmentStatus> {
        prop::sample::select(AppointmentStatus::ALL.to_vec())
    }

    proptest! {
        /// Terminal reservations reject every target for every actor.
        #[test]
        fn terminal_reservations_are_frozen(
            from in prop::sample::select(vec![ReservationStatus::Rejected, ReservationStatus::Finalized]),
            to in reservation_status(),
            roles in roles(),
            reason in reason(),
        ) {
            let r = Reservation::fixture(from);
            let err = attempt_transition_as(&r, to, &roles, reason.as_deref()).unwrap_err();
            let is_invalid_state = matches!(err, TransitionRejected::InvalidState { .. });
            prop_assert!(is_invalid_state);
            prop_assert!(allowed_actions(&r, &roles).is_empty());
        }

        /// Terminal appointments reject every target for every actor.
        #[test]
        fn terminal_appointments_are_frozen(
            from in prop::sample::select(vec![
                AppointmentStatus::Attended,
                AppointmentStatus::Absent,
                AppointmentStatus::Cancelled,
            ]),
            to in appointment_status(),
            roles in roles(),
        ) {
            let a = Appointment::fixture(from);
            let err = attempt_transition_as(&a, to, &roles, None).unwrap_err();
            let is_invalid_state = matches!(err, TransitionRejected::InvalidState { .. });
            prop_assert!(is_invalid_state);
        }

        /// The offered actions are exactly the ones the engine accepts.
        #[test]
        fn allowed_actions_agree_with_engine(
            from in reservation_status(),
            roles in roles(),
        ) {
            let r = Reservation::fixture(from);
            let offered = allowed_actions(&r, &roles);
            for to in ReservationStatus::ALL {
                let reason = to.requires_reason().then_some("reason");
                let accepted = attempt_transition_as(&r, to, &roles, reason).is_ok();
                let listed = offered.iter().any(|a| a.target == Some(to));
                prop_assert_eq!(accepted, listed);
            }
            let withdrawable = attempt_withdrawal(&r, &roles).is_ok();
            let listed = offered.iter().any(|a| a.action == Action::Withdraw);
            prop_assert_eq!(withdrawable, listed);
        }

        /// A failed attempt never alters the entity; a successful one only
        /// changes status and reason.
        #[test]
        fn input_is_never_modified(
            from in reservation_status(),
            to in reservation_status(),
            roles in roles(),
            reason in reason(),
        ) {
            let r = Reservation::fixture(from);
            let before = r.clone();
            if let Ok(next) = attempt_transition_as(&r, to, &roles, reason.as_deref()) {
                prop_assert_eq!(next.status(), to);
                prop_assert_eq!(next.id(), before.id());
                prop_assert_eq!(next.rejection_reason().is_some(), to == ReservationStatus::Rejected);
            }
            prop_assert_eq!(r, before);
        }
    }
}
