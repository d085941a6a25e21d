//! # Role Resolver
//!
//! Maps decoded claims to an [`Identity`] for a given [`Deployment`]:
//!
//! 1. **Extract.** The `roles` list if present (even when empty), else the
//!    single `role` claim, else the deployment's default role.
//! 2. **Filter.** Each string is parsed into a [`Role`]. Unknown names and
//!    roles that do not exist in the deployment are dropped. Duplicates
//!    collapse onto their first occurrence.
//! 3. **Prioritize.** The first role of [`Deployment::priority`] present in
//!    the set becomes the primary role; otherwise the first role of the set.
//!
//! An explicit empty list is an error, as is a non-empty list that filters
//! down to nothing. Only a credential with no role claim at all receives the
//! default role.
//!
//! Permission checks use [`Identity::roles`], never only the primary role.

use opsdesk_core::{Deployment, Role, SubjectId};
use serde::Serialize;
use tracing::warn;

use crate::claims::Claims;
use crate::error::DecodeError;

/// The resolved session principal.
///
/// Constructed only by [`resolve`]. Invariants: `roles` is non-empty and
/// duplicate-free, and `primary_role` is one of `roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    subject_id: SubjectId,
    roles: Vec<Role>,
    primary_role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl Identity {
    /// The credential subject.
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Every role held, in credential order.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The role used for default navigation and display.
    pub fn primary_role(&self) -> Role {
        self.primary_role
    }

    /// Display name, falling back to the email claim.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether the identity holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether the identity holds at least one of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }
}

/// Resolve claims into an identity for `deployment`.
pub fn resolve(claims: &Claims, deployment: Deployment) -> Result<Identity, DecodeError> {
    let raw: Vec<String> = match (&claims.roles, &claims.role) {
        (Some(list), _) => {
            if list.is_empty() {
                return Err(DecodeError::EmptyRoleSet);
            }
            list.clone()
        }
        (None, Some(single)) => vec![single.clone()],
        (None, None) => vec![deployment.default_role().as_str().to_string()],
    };

    let mut roles: Vec<Role> = Vec::with_capacity(raw.len());
    for name in &raw {
        match name.parse::<Role>() {
            Ok(role) if deployment.supports(role) => {
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
            Ok(role) => {
                warn!(subject = %claims.subject, %role, %deployment, "dropping role foreign to deployment");
            }
            Err(_) => {
                warn!(subject = %claims.subject, role = %name, "dropping unknown role claim");
            }
        }
    }

    let Some(&first) = roles.first() else {
        return Err(DecodeError::UnrecognizedRoles {
            deployment,
            roles: raw,
        });
    };

    let primary_role = deployment
        .priority()
        .iter()
        .copied()
        .find(|candidate| roles.contains(candidate))
        .unwrap_or(first);

    Ok(Identity {
        subject_id: claims.subject.clone(),
        roles,
        primary_role,
        display_name: claims.name.clone().or_else(|| claims.email.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Option<&str>, roles: Option<&[&str]>) -> Claims {
        Claims {
            subject: SubjectId::new("u1").unwrap(),
            role: role.map(str::to_string),
            roles: roles.map(|r| r.iter().map(|s| s.to_string()).collect()),
            name: None,
            email: None,
            expires_at: None,
            issued_at: None,
        }
    }

    const IC: Deployment = Deployment::InnovationCenter;

    #[test]
    fn admin_outranks_gestor_in_either_order() {
        for list in [&["admin", "gestor"][..], &["gestor", "admin"][..]] {
            let id = resolve(&claims(None, Some(list)), IC).unwrap();
            assert_eq!(id.primary_role(), Role::Admin);
            assert!(id.has_role(Role::Gestor));
            assert_eq!(id.roles().len(), 2);
        }
    }

    #[test]
    fn single_role_is_wrapped() {
        let id = resolve(&claims(Some("docente"), None), IC).unwrap();
        assert_eq!(id.roles(), &[Role::Docente]);
        assert_eq!(id.primary_role(), Role::Docente);
    }

    #[test]
    fn list_takes_precedence_over_single_role() {
        let id = resolve(&claims(Some("admin"), Some(&["docente"])), IC).unwrap();
        assert_eq!(id.roles(), &[Role::Docente]);
    }

    #[test]
    fn no_role_claim_defaults_to_lowest_privilege() {
        let id = resolve(&claims(None, None), IC).unwrap();
        assert_eq!(id.roles(), &[Role::Docente]);
        let id = resolve(&claims(None, None), Deployment::Clinic).unwrap();
        assert_eq!(id.roles(), &[Role::Medico]);
    }

    #[test]
    fn empty_list_is_an_error() {
        let err = resolve(&claims(Some("admin"), Some(&[])), IC).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyRoleSet));
    }

    #[test]
    fn unknown_roles_only_is_an_error() {
        let err = resolve(&claims(None, Some(&["root", "medico"])), IC).unwrap_err();
        match err {
            DecodeError::UnrecognizedRoles { deployment, roles } => {
                assert_eq!(deployment, IC);
                assert_eq!(roles, vec!["root".to_string(), "medico".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_roles_are_dropped() {
        let id = resolve(&claims(None, Some(&["root", "docente"])), IC).unwrap();
        assert_eq!(id.roles(), &[Role::Docente]);
    }

    #[test]
    fn duplicates_collapse() {
        let id = resolve(&claims(None, Some(&["gestor", "GESTOR", "docente"])), IC).unwrap();
        assert_eq!(id.roles(), &[Role::Gestor, Role::Docente]);
        assert_eq!(id.primary_role(), Role::Gestor);
    }

    #[test]
    fn clinic_without_priority_match_uses_first_claimed() {
        let id = resolve(
            &claims(None, Some(&["medico", "recepcionista"])),
            Deployment::Clinic,
        )
        .unwrap();
        assert_eq!(id.primary_role(), Role::Medico);
        let id = resolve(
            &claims(None, Some(&["recepcionista", "medico", "admin"])),
            Deployment::Clinic,
        )
        .unwrap();
        assert_eq!(id.primary_role(), Role::Admin);
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut c = claims(Some("docente"), None);
        c.email = Some("ana@lab.edu".to_string());
        let id = resolve(&c, IC).unwrap();
        assert_eq!(id.display_name(), Some("ana@lab.edu"));
        c.name = Some("Ana".to_string());
        let id = resolve(&c, IC).unwrap();
        assert_eq!(id.display_name(), Some("Ana"));
    }
}
