//! # Reservation Lifecycle
//!
//! A requester (docente) asks for a resource over a time window; a reviewer
//! (gestor or admin) approves or rejects it; approved reservations are
//! finalized once their window has elapsed.
//!
//! ## States
//!
//! ```text
//! PENDING ──approve──▶ APPROVED ──finalize──▶ FINALIZED (terminal)
//!    │
//!    ├──reject (reason)──▶ REJECTED (terminal)
//!    │
//!    └──withdraw (docente)──▶ deleted
//! ```
//!
//! Field and status names are written in English. The backend's Spanish
//! names (`PENDIENTE`, `motivoRechazo`, `fechaInicio`, ...) are accepted on
//! input.

use opsdesk_core::{EntityRef, Role, SubjectId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorkflowError;
use crate::reference;
use crate::workflow::{Action, EntityDraft, TransitionRule, WorkflowEntity, WorkflowStatus};

// ─── Reservation Status ──────────────────────────────────────────────

/// The lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Awaiting review.
    #[serde(rename = "PENDING", alias = "PENDIENTE")]
    Pending,
    /// Approved by a reviewer.
    #[serde(rename = "APPROVED", alias = "APROBADA")]
    Approved,
    /// Rejected with a reason (terminal).
    #[serde(rename = "REJECTED", alias = "RECHAZADA")]
    Rejected,
    /// The reserved window has been used (terminal).
    #[serde(rename = "FINALIZED", alias = "FINALIZADA")]
    Finalized,
}

impl ReservationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Finalized];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Finalized => "FINALIZED",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PENDIENTE" => Ok(Self::Pending),
            "APPROVED" | "APROBADA" => Ok(Self::Approved),
            "REJECTED" | "RECHAZADA" => Ok(Self::Rejected),
            "FINALIZED" | "FINALIZADA" => Ok(Self::Finalized),
            _ => Err(format!("unknown reservation status: {s:?}")),
        }
    }
}

const REVIEWERS: &[Role] = &[Role::Gestor, Role::Admin];

static RESERVATION_RULES: [TransitionRule<ReservationStatus>; 3] = [
    TransitionRule {
        from: ReservationStatus::Pending,
        to: ReservationStatus::Approved,
        action: Action::Approve,
        roles: REVIEWERS,
    },
    TransitionRule {
        from: ReservationStatus::Pending,
        to: ReservationStatus::Rejected,
        action: Action::Reject,
        roles: REVIEWERS,
    },
    TransitionRule {
        from: ReservationStatus::Approved,
        to: ReservationStatus::Finalized,
        action: Action::Finalize,
        roles: REVIEWERS,
    },
];

impl WorkflowStatus for ReservationStatus {
    const INITIAL: Self = Self::Pending;

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Finalized)
    }

    fn requires_reason(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    fn rules() -> &'static [TransitionRule<Self>] {
        &RESERVATION_RULES
    }
}

// ─── Reservation ─────────────────────────────────────────────────────

/// A reservation of a resource over `[starts_at, ends_at)`.
///
/// `status` and `rejection_reason` change only through the workflow engine.
/// Deserialization enforces the entity invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ReservationRecord")]
pub struct Reservation {
    id: EntityRef,
    requester: SubjectId,
    resource: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewer: Option<SubjectId>,
    starts_at: Timestamp,
    ends_at: Timestamp,
    purpose: String,
    status: ReservationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
}

/// Unchecked wire form of a [`Reservation`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReservationRecord {
    #[serde(alias = "_id")]
    id: EntityRef,
    #[serde(alias = "solicitante", deserialize_with = "reference::required")]
    requester: SubjectId,
    #[serde(alias = "recurso", deserialize_with = "reference::required")]
    resource: EntityRef,
    #[serde(default, alias = "aprobador", deserialize_with = "reference::optional")]
    reviewer: Option<SubjectId>,
    #[serde(alias = "fechaInicio")]
    starts_at: Timestamp,
    #[serde(alias = "fechaFin")]
    ends_at: Timestamp,
    #[serde(alias = "proposito")]
    purpose: String,
    #[serde(alias = "estado")]
    status: ReservationStatus,
    #[serde(default, alias = "motivoRechazo")]
    rejection_reason: Option<String>,
}

impl TryFrom<ReservationRecord> for Reservation {
    type Error = WorkflowError;

    fn try_from(raw: ReservationRecord) -> Result<Self, Self::Error> {
        let reservation = Self {
            id: raw.id,
            requester: raw.requester,
            resource: raw.resource,
            reviewer: raw.reviewer,
            starts_at: raw.starts_at,
            ends_at: raw.ends_at,
            purpose: raw.purpose.trim().to_string(),
            status: raw.status,
            rejection_reason: raw
                .rejection_reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        };
        reservation.validate()?;
        Ok(reservation)
    }
}

impl Reservation {
    /// A new pending reservation, as returned by the backend after creation.
    pub fn new(
        id: EntityRef,
        requester: SubjectId,
        resource: EntityRef,
        starts_at: Timestamp,
        ends_at: Timestamp,
        purpose: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        let reservation = Self {
            id,
            requester,
            resource,
            reviewer: None,
            starts_at,
            ends_at,
            purpose: purpose.into().trim().to_string(),
            status: ReservationStatus::Pending,
            rejection_reason: None,
        };
        reservation.validate()?;
        Ok(reservation)
    }

    /// Check the entity invariants: `starts_at < ends_at`, a non-empty
    /// purpose, and a rejection reason present exactly when rejected.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        check_window(self.starts_at, self.ends_at)?;
        if self.purpose.is_empty() {
            return Err(WorkflowError::EmptyField { field: "purpose" });
        }
        match (self.status, &self.rejection_reason) {
            (ReservationStatus::Rejected, None) => Err(WorkflowError::MissingRejectionReason),
            (ReservationStatus::Rejected, Some(_)) | (_, None) => Ok(()),
            (status, Some(_)) => Err(WorkflowError::UnexpectedRejectionReason {
                status: status.to_string(),
            }),
        }
    }

    /// Record the reviewer who acted on this reservation.
    pub fn with_reviewer(mut self, reviewer: SubjectId) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// The requesting user.
    pub fn requester(&self) -> &SubjectId {
        &self.requester
    }

    /// The reserved resource.
    pub fn resource(&self) -> &EntityRef {
        &self.resource
    }

    /// The reviewer, once one has acted.
    pub fn reviewer(&self) -> Option<&SubjectId> {
        self.reviewer.as_ref()
    }

    /// Start of the reserved window.
    pub fn starts_at(&self) -> Timestamp {
        self.starts_at
    }

    /// End of the reserved window.
    pub fn ends_at(&self) -> Timestamp {
        self.ends_at
    }

    /// Stated purpose.
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// Reason given on rejection.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Whether the window has elapsed on an approved reservation.
    pub fn is_due_for_finalization(&self, now: Timestamp) -> bool {
        self.status == ReservationStatus::Approved && self.ends_at <= now
    }

    #[cfg(test)]
    pub(crate) fn fixture(status: ReservationStatus) -> Self {
        let mut r = Self::new(
            EntityRef::new("r-1").unwrap(),
            SubjectId::new("docente-1").unwrap(),
            EntityRef::new("lab-3").unwrap(),
            Timestamp::parse("2025-03-01T10:00:00Z").unwrap(),
            Timestamp::parse("2025-03-01T12:00:00Z").unwrap(),
            "robotics workshop",
        )
        .unwrap();
        r.status = status;
        if status == ReservationStatus::Rejected {
            r.rejection_reason = Some("fixture".into());
        }
        r
    }
}

impl WorkflowEntity for Reservation {
    type Status = ReservationStatus;

    const COLLECTION: &'static str = "reservations";
    const WITHDRAWAL_ROLES: &'static [Role] = &[Role::Docente];
    const CREATION_ROLES: &'static [Role] = &[Role::Docente];

    fn id(&self) -> &EntityRef {
        &self.id
    }

    fn status(&self) -> ReservationStatus {
        self.status
    }

    fn enter_status(&mut self, status: ReservationStatus, reason: Option<String>) {
        self.status = status;
        self.rejection_reason = reason;
    }
}

fn check_window(starts_at: Timestamp, ends_at: Timestamp) -> Result<(), WorkflowError> {
    if starts_at < ends_at {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTimeRange { starts_at, ends_at })
    }
}

/// The finalized copy of `reservation` if it is approved and its window
/// ended at or before `now`.
///
/// This is a system transition: no role is involved.
pub fn finalize_elapsed(reservation: &Reservation, now: Timestamp) -> Option<Reservation> {
    if !reservation.is_due_for_finalization(now) {
        return None;
    }
    let mut next = reservation.clone();
    next.enter_status(ReservationStatus::Finalized, None);
    debug!(id = %reservation.id, ends_at = %reservation.ends_at, "reservation window elapsed");
    Some(next)
}

// ─── Draft ───────────────────────────────────────────────────────────

/// Payload for creating a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDraft {
    /// Resource to reserve.
    #[serde(alias = "recurso")]
    pub resource: EntityRef,
    /// Start of the window.
    #[serde(alias = "fechaInicio")]
    pub starts_at: Timestamp,
    /// End of the window.
    #[serde(alias = "fechaFin")]
    pub ends_at: Timestamp,
    /// Stated purpose.
    #[serde(alias = "proposito")]
    pub purpose: String,
}

impl EntityDraft for ReservationDraft {
    type Entity = Reservation;

    fn validate(&self) -> Result<(), WorkflowError> {
        check_window(self.starts_at, self.ends_at)?;
        if self.purpose.trim().is_empty() {
            return Err(WorkflowError::EmptyField { field: "purpose" });
        }
        Ok(())
    }
}
