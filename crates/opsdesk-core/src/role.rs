//! # Roles
//!
//! The closed set of roles a console session can hold. Which roles are
//! meaningful, and in which priority order, is decided per [`Deployment`];
//! this module only names them.
//!
//! Role names travel in credentials as lower-case strings (`"admin"`,
//! `"gestor"`, ...). Parsing is case-insensitive and ignores surrounding
//! whitespace, serialization is always lower-case.
//!
//! [`Deployment`]: crate::Deployment

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A role held by a console user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Facility administrator. Present in every deployment.
    Admin,
    /// Resource manager of the innovation center; reviews reservations.
    Gestor,
    /// Teaching staff of the innovation center; requests reservations.
    Docente,
    /// Clinic front desk; schedules and cancels appointments.
    Recepcionista,
    /// Clinic physician; records appointment outcomes.
    Medico,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Gestor,
        Role::Docente,
        Role::Recepcionista,
        Role::Medico,
    ];

    /// The wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Gestor => "gestor",
            Self::Docente => "docente",
            Self::Recepcionista => "recepcionista",
            Self::Medico => "medico",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}
