//! # Appointment Lifecycle
//!
//! Reception (recepcionista or admin) schedules a patient with a physician;
//! the physician records the outcome, or reception cancels.
//!
//! ```text
//! SCHEDULED ──mark-attended (medico)──────────▶ ATTENDED  (terminal)
//!     ├─────mark-absent (medico)────────────▶ ABSENT    (terminal)
//!     └─────cancel (recepcionista, admin)───▶ CANCELLED (terminal)
//! ```
//!
//! Appointments have no withdrawal; cancelling is an ordinary status change.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use opsdesk_core::{EntityRef, Role, SubjectId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WorkflowError;
use crate::reference;
use crate::workflow::{Action, EntityDraft, TransitionRule, WorkflowEntity, WorkflowStatus};

/// The lifecycle status of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    /// Booked, awaiting the visit.
    #[serde(rename = "SCHEDULED", alias = "PROGRAMADO")]
    Scheduled,
    /// The patient was seen (terminal).
    #[serde(rename = "ATTENDED", alias = "ATENDIDO")]
    Attended,
    /// The patient did not show up (terminal).
    #[serde(rename = "ABSENT", alias = "AUSENTE")]
    Absent,
    /// Called off by reception (terminal).
    #[serde(rename = "CANCELLED", alias = "CANCELADO")]
    Cancelled,
}

impl AppointmentStatus {
    /// All statuses.
    pub const ALL: [Self; 4] = [Self::Scheduled, Self::Attended, Self::Absent, Self::Cancelled];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Attended => "ATTENDED",
            Self::Absent => "ABSENT",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" | "PROGRAMADO" => Ok(Self::Scheduled),
            "ATTENDED" | "ATENDIDO" => Ok(Self::Attended),
            "ABSENT" | "AUSENTE" => Ok(Self::Absent),
            "CANCELLED" | "CANCELADO" => Ok(Self::Cancelled),
            _ => Err(format!("unknown appointment status: {s:?}")),
        }
    }
}

static APPOINTMENT_RULES: [TransitionRule<AppointmentStatus>; 3] = [
    TransitionRule {
        from: AppointmentStatus::Scheduled,
        to: AppointmentStatus::Attended,
        action: Action::MarkAttended,
        roles: &[Role::Medico],
    },
    TransitionRule {
        from: AppointmentStatus::Scheduled,
        to: AppointmentStatus::Absent,
        action: Action::MarkAbsent,
        roles: &[Role::Medico],
    },
    TransitionRule {
        from: AppointmentStatus::Scheduled,
        to: AppointmentStatus::Cancelled,
        action: Action::Cancel,
        roles: &[Role::Recepcionista, Role::Admin],
    },
];

impl WorkflowStatus for AppointmentStatus {
    const INITIAL: Self = Self::Scheduled;

    fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scheduled)
    }

    fn requires_reason(&self) -> bool {
        false
    }

    fn rules() -> &'static [TransitionRule<Self>] {
        &APPOINTMENT_RULES
    }
}

// ─── Schedule encoding ───────────────────────────────────────────────

/// Dates are written `YYYY-MM-DD`. The backend stores them as midnight UTC
/// datetimes, which are also accepted.
mod visit_date {
    use super::*;

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc).date_naive()))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw:?}")))
    }
}

/// Times are written `HH:MM`; seconds are accepted on input.
mod visit_time {
    use super::*;

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time: {raw:?}")))
    }
}

/// Parse a visit date (`YYYY-MM-DD` or an RFC 3339 datetime).
pub fn parse_visit_date(raw: &str) -> Result<NaiveDate, WorkflowError> {
    visit_date::parse(raw).ok_or_else(|| WorkflowError::InvalidSchedule {
        field: "date",
        value: raw.to_string(),
    })
}

/// Parse a visit time (`HH:MM` or `HH:MM:SS`).
pub fn parse_visit_time(raw: &str) -> Result<NaiveTime, WorkflowError> {
    visit_time::parse(raw).ok_or_else(|| WorkflowError::InvalidSchedule {
        field: "time",
        value: raw.to_string(),
    })
}

// ─── Appointment ─────────────────────────────────────────────────────

/// A patient visit with a physician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(alias = "_id")]
    id: EntityRef,
    #[serde(
        default,
        alias = "creadoPor",
        deserialize_with = "reference::optional",
        skip_serializing_if = "Option::is_none"
    )]
    scheduled_by: Option<SubjectId>,
    #[serde(alias = "paciente", deserialize_with = "reference::required")]
    patient: EntityRef,
    #[serde(alias = "medico", deserialize_with = "reference::required")]
    physician: SubjectId,
    #[serde(alias = "fecha", with = "visit_date")]
    date: NaiveDate,
    #[serde(alias = "hora", with = "visit_time")]
    time: NaiveTime,
    #[serde(default, alias = "motivo", skip_serializing_if = "Option::is_none")]
    visit_reason: Option<String>,
    #[serde(alias = "estado")]
    status: AppointmentStatus,
}

impl Appointment {
    /// A new scheduled appointment, as returned by the backend after creation.
    pub fn new(
        id: EntityRef,
        patient: EntityRef,
        physician: SubjectId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Self {
        Self {
            id,
            scheduled_by: None,
            patient,
            physician,
            date,
            time,
            visit_reason: None,
            status: AppointmentStatus::Scheduled,
        }
    }

    /// The receptionist or admin who booked the visit.
    pub fn scheduled_by(&self) -> Option<&SubjectId> {
        self.scheduled_by.as_ref()
    }

    /// The patient record.
    pub fn patient(&self) -> &EntityRef {
        &self.patient
    }

    /// The attending physician.
    pub fn physician(&self) -> &SubjectId {
        &self.physician
    }

    /// Visit date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Visit time.
    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Date and time combined (facility local time).
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Why the patient is coming in.
    pub fn visit_reason(&self) -> Option<&str> {
        self.visit_reason.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn fixture(status: AppointmentStatus) -> Self {
        let mut a = Self::new(
            EntityRef::new("a-1").unwrap(),
            EntityRef::new("patient-7").unwrap(),
            SubjectId::new("medico-2").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        );
        a.status = status;
        a
    }
}

impl WorkflowEntity for Appointment {
    type Status = AppointmentStatus;

    const COLLECTION: &'static str = "appointments";
    const WITHDRAWAL_ROLES: &'static [Role] = &[];
    const CREATION_ROLES: &'static [Role] = &[Role::Recepcionista, Role::Admin];

    fn id(&self) -> &EntityRef {
        &self.id
    }

    fn status(&self) -> AppointmentStatus {
        self.status
    }

    fn enter_status(&mut self, status: AppointmentStatus, _reason: Option<String>) {
        self.status = status;
    }
}

/// Payload for booking an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    /// Patient record.
    #[serde(alias = "paciente")]
    pub patient: EntityRef,
    /// Attending physician.
    #[serde(alias = "medico")]
    pub physician: SubjectId,
    /// Visit date.
    #[serde(alias = "fecha", with = "visit_date")]
    pub date: NaiveDate,
    /// Visit time.
    #[serde(alias = "hora", with = "visit_time")]
    pub time: NaiveTime,
    /// Why the patient is coming in.
    #[serde(default, alias = "motivo", skip_serializing_if = "Option::is_none")]
    pub visit_reason: Option<String>,
}

impl EntityDraft for AppointmentDraft {
    type Entity = Appointment;

    // Identifier newtypes already reject empty refs.
    fn validate(&self) -> Result<(), WorkflowError> {
        match &self.visit_reason {
            Some(reason) if reason.trim().is_empty() => {
                Err(WorkflowError::EmptyField { field: "visitReason" })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_non_initial_status_is_terminal() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.is_terminal(), status != AppointmentStatus::INITIAL);
            assert!(!status.requires_reason());
        }
    }

    #[test]
    fn status_parse_accepts_both_languages() {
        assert_eq!("cancelado".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Cancelled);
        assert_eq!("ABSENT".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Absent);
        assert!("FINALIZED".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn deserializes_backend_document() {
        let doc = json!({
            "_id": "c-19",
            "paciente": "p-4",
            "medico": "m-1",
            "fecha": "2025-03-04T00:00:00.000Z",
            "hora": "09:30",
            "motivo": "control",
            "estado": "PROGRAMADO",
            "creadoPor": "rec-2"
        });
        let a: Appointment = serde_json::from_value(doc).unwrap();
        assert_eq!(a.status(), AppointmentStatus::Scheduled);
        assert_eq!(a.date(), NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(a.visit_reason(), Some("control"));
        assert_eq!(a.scheduled_by().map(|s| s.as_str()), Some("rec-2"));

        let out = serde_json::to_value(&a).unwrap();
        assert_eq!(out["date"], "2025-03-04");
        assert_eq!(out["time"], "09:30");
        assert_eq!(out["status"], "SCHEDULED");
    }

    #[test]
    fn rejects_bad_schedule() {
        let doc = json!({
            "id": "c", "patient": "p", "physician": "m",
            "date": "04/03/2025", "time": "09:30", "status": "SCHEDULED"
        });
        assert!(serde_json::from_value::<Appointment>(doc).is_err());
        assert!(parse_visit_time("25:00").is_err());
        assert_eq!(parse_visit_time("08:15:30").unwrap(), NaiveTime::from_hms_opt(8, 15, 30).unwrap());
        assert!(matches!(
            parse_visit_date("tomorrow"),
            Err(WorkflowError::InvalidSchedule { field: "date", .. })
        ));
    }

    #[test]
    fn scheduled_at_combines_date_and_time() {
        let a = Appointment::fixture(AppointmentStatus::Scheduled);
        assert_eq!(a.scheduled_at().to_string(), "2025-03-04 09:30:00");
    }

    #[test]
    fn draft_blank_reason_is_rejected() {
        let draft = AppointmentDraft {
            patient: EntityRef::new("p").unwrap(),
            physician: SubjectId::new("m").unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            visit_reason: Some(" ".into()),
        };
        assert!(draft.validate().is_err());
        assert!(AppointmentDraft { visit_reason: None, ..draft }.validate().is_ok());
    }
}
