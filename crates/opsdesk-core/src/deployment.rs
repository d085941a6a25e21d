//! # Deployments
//!
//! The console ships for two kinds of facility. Each [`Deployment`] fixes:
//!
//! - the roles that exist there,
//! - the priority list used to pick a primary role (most privileged first),
//! - the lowest-privilege role assumed when a credential names no role at all.
//!
//! ```text
//! innovation-center   roles: admin, gestor, docente
//!                     priority: admin > gestor         default: docente
//!
//! clinic              roles: admin, recepcionista, medico
//!                     priority: admin                  default: medico
//! ```
//!
//! The clinic has no intermediate tier: a clinic user holding both
//! `recepcionista` and `medico` gets whichever the credential lists first as
//! primary role.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::role::Role;

/// The facility variant a console is deployed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Deployment {
    /// Innovation/lab center: resources and reservations.
    #[default]
    InnovationCenter,
    /// Clinic: patients and appointments.
    Clinic,
}

impl Deployment {
    /// Every deployment.
    pub const ALL: [Deployment; 2] = [Deployment::InnovationCenter, Deployment::Clinic];

    /// Roles that exist in this deployment.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Self::InnovationCenter => &[Role::Admin, Role::Gestor, Role::Docente],
            Self::Clinic => &[Role::Admin, Role::Recepcionista, Role::Medico],
        }
    }

    /// Primary-role priority list, most privileged first.
    ///
    /// Not necessarily exhaustive: roles missing from the list fall back to
    /// credential order during resolution.
    pub fn priority(&self) -> &'static [Role] {
        match self {
            Self::InnovationCenter => &[Role::Admin, Role::Gestor],
            Self::Clinic => &[Role::Admin],
        }
    }

    /// Role assumed when a credential carries neither `roles` nor `role`.
    pub fn default_role(&self) -> Role {
        match self {
            Self::InnovationCenter => Role::Docente,
            Self::Clinic => Role::Medico,
        }
    }

    /// Whether `role` exists in this deployment.
    pub fn supports(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// Human-readable facility title shown in the console header.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InnovationCenter => "Centro de Innovación",
            Self::Clinic => "Centro Médico",
        }
    }

    /// The configuration name of the deployment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InnovationCenter => "innovation-center",
            Self::Clinic => "clinic",
        }
    }
}

impl std::fmt::Display for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Deployment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Deployment::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ValidationError::UnknownDeployment(s.to_string()))
    }
}
