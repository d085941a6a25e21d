//! # Route Table
//!
//! The console's route surface per deployment. Each route declares who may
//! open it; the [`AccessGuard`](crate::AccessGuard) evaluates that against
//! the session on every navigation.
//!
//! A route covers its own path and everything below it (`/gestor/reservas`
//! belongs to `/gestor`). Paths that match nothing fall through to the login
//! page.

use opsdesk_core::{Deployment, Role};

use crate::guard::{authorize, LOGIN_PATH, UNAUTHORIZED_PATH};
use crate::resolver::Identity;

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, with or without a session.
    Public,
    /// Any authenticated identity.
    Authenticated,
    /// Identities holding at least one of these roles.
    Roles(&'static [Role]),
}

impl Access {
    /// Required roles in the form [`authorize`] expects.
    pub fn required_roles(&self) -> Option<&'static [Role]> {
        match *self {
            Self::Roles(roles) => Some(roles),
            Self::Public | Self::Authenticated => None,
        }
    }
}

/// A single console route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    /// Path prefix, starting with `/`.
    pub path: &'static str,
    /// Access requirement.
    pub access: Access,
    /// Menu label.
    pub label: &'static str,
}

const DASHBOARD_PATH: &str = "/dashboard";

static INNOVATION_CENTER_ROUTES: [RouteRule; 6] = [
    RouteRule { path: LOGIN_PATH, access: Access::Public, label: "Login" },
    RouteRule { path: UNAUTHORIZED_PATH, access: Access::Public, label: "No autorizado" },
    RouteRule { path: DASHBOARD_PATH, access: Access::Authenticated, label: "Inicio" },
    RouteRule { path: "/admin", access: Access::Roles(&[Role::Admin]), label: "Gestionar Usuarios" },
    RouteRule {
        path: "/gestor",
        access: Access::Roles(&[Role::Gestor, Role::Admin]),
        label: "Gestión de Recursos y Reservas",
    },
    RouteRule { path: "/docente", access: Access::Roles(&[Role::Docente]), label: "Mis Reservas" },
];

static CLINIC_ROUTES: [RouteRule; 6] = [
    RouteRule { path: LOGIN_PATH, access: Access::Public, label: "Login" },
    RouteRule { path: UNAUTHORIZED_PATH, access: Access::Public, label: "No autorizado" },
    RouteRule { path: DASHBOARD_PATH, access: Access::Authenticated, label: "Inicio" },
    RouteRule { path: "/admin", access: Access::Roles(&[Role::Admin]), label: "Gestionar Usuarios" },
    RouteRule {
        path: "/recepcion",
        access: Access::Roles(&[Role::Recepcionista, Role::Admin]),
        label: "Gestionar Turnos",
    },
    RouteRule { path: "/medico", access: Access::Roles(&[Role::Medico]), label: "Mis Turnos" },
];

/// Routes of one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTable {
    deployment: Deployment,
    rules: &'static [RouteRule],
}

impl RouteTable {
    /// The route table shipped with `deployment`.
    pub fn for_deployment(deployment: Deployment) -> Self {
        let rules: &'static [RouteRule] = match deployment {
            Deployment::InnovationCenter => &INNOVATION_CENTER_ROUTES,
            Deployment::Clinic => &CLINIC_ROUTES,
        };
        Self { deployment, rules }
    }

    /// The deployment this table belongs to.
    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    /// Every route.
    pub fn rules(&self) -> &'static [RouteRule] {
        self.rules
    }

    /// The route covering `path`, preferring the longest match.
    ///
    /// Query strings, fragments, and trailing slashes are ignored.
    pub fn match_path(&self, path: &str) -> Option<&'static RouteRule> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        self.rules
            .iter()
            .filter(|rule| {
                path == rule.path
                    || path
                        .strip_prefix(rule.path)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|rule| rule.path.len())
    }

    /// Protected routes `identity` may open, in table order.
    pub fn navigation(&self, identity: &Identity) -> Vec<&'static RouteRule> {
        self.rules
            .iter()
            .filter(|rule| rule.access != Access::Public)
            .filter(|rule| authorize(Some(identity), rule.access.required_roles()).is_allowed())
            .collect()
    }

    /// Default route for `identity`, chosen by its primary role.
    pub fn landing_path(&self, identity: &Identity) -> &'static str {
        let preferred = match identity.primary_role() {
            Role::Admin => "/admin",
            Role::Gestor => "/gestor",
            Role::Docente => "/docente",
            Role::Recepcionista => "/recepcion",
            Role::Medico => "/medico",
        };
        self.rules
            .iter()
            .find(|rule| rule.path == preferred)
            .filter(|rule| authorize(Some(identity), rule.access.required_roles()).is_allowed())
            .map(|rule| rule.path)
            .unwrap_or(DASHBOARD_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Claims;
    use crate::resolver::resolve;
    use opsdesk_core::SubjectId;

    fn identity(roles: &[&str], deployment: Deployment) -> Identity {
        let claims = Claims {
            subject: SubjectId::new("u").unwrap(),
            role: None,
            roles: Some(roles.iter().map(|r| r.to_string()).collect()),
            name: None,
            email: None,
            expires_at: None,
            issued_at: None,
        };
        resolve(&claims, deployment).unwrap()
    }

    #[test]
    fn match_exact_and_subtree() {
        let table = RouteTable::for_deployment(Deployment::InnovationCenter);
        assert_eq!(table.match_path("/gestor").unwrap().path, "/gestor");
        assert_eq!(table.match_path("/gestor/").unwrap().path, "/gestor");
        assert_eq!(table.match_path("/gestor/reservas?estado=PENDING").unwrap().path, "/gestor");
        assert!(table.match_path("/gestores").is_none());
        assert!(table.match_path("/").is_none());
        assert!(table.match_path("").is_none());
    }

    #[test]
    fn clinic_has_no_gestor_route() {
        let table = RouteTable::for_deployment(Deployment::Clinic);
        assert!(table.match_path("/gestor").is_none());
        assert_eq!(table.match_path("/recepcion#turnos").unwrap().path, "/recepcion");
    }

    #[test]
    fn navigation_uses_full_role_set() {
        let table = RouteTable::for_deployment(Deployment::InnovationCenter);
        let id = identity(&["admin", "docente"], Deployment::InnovationCenter);
        let paths: Vec<_> = table.navigation(&id).iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/dashboard", "/admin", "/gestor", "/docente"]);
    }

    #[test]
    fn navigation_for_docente() {
        let table = RouteTable::for_deployment(Deployment::InnovationCenter);
        let id = identity(&["docente"], Deployment::InnovationCenter);
        let paths: Vec<_> = table.navigation(&id).iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/dashboard", "/docente"]);
    }

    #[test]
    fn landing_follows_primary_role() {
        let ic = RouteTable::for_deployment(Deployment::InnovationCenter);
        assert_eq!(ic.landing_path(&identity(&["docente", "gestor"], Deployment::InnovationCenter)), "/gestor");
        assert_eq!(ic.landing_path(&identity(&["docente"], Deployment::InnovationCenter)), "/docente");

        let clinic = RouteTable::for_deployment(Deployment::Clinic);
        assert_eq!(clinic.landing_path(&identity(&["medico"], Deployment::Clinic)), "/medico");
        assert_eq!(clinic.landing_path(&identity(&["recepcionista"], Deployment::Clinic)), "/recepcion");
    }

    #[test]
    fn every_table_has_public_login_and_unauthorized() {
        for deployment in Deployment::ALL {
            let table = RouteTable::for_deployment(deployment);
            assert_eq!(table.match_path(LOGIN_PATH).unwrap().access, Access::Public);
            assert_eq!(table.match_path(UNAUTHORIZED_PATH).unwrap().access, Access::Public);
            for rule in table.rules() {
                if let Access::Roles(roles) = rule.access {
                    assert!(roles.iter().all(|r| deployment.supports(*r)), "{}", rule.path);
                }
            }
        }
    }
}
