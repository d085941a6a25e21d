//! # Access Guard
//!
//! [`authorize`] is the single decision function behind every protected
//! view:
//!
//! 1. no identity → [`Decision::RedirectLogin`]
//! 2. no required roles → [`Decision::Allow`]
//! 3. required ∩ identity roles = ∅ → [`Decision::RedirectUnauthorized`]
//! 4. otherwise → [`Decision::Allow`]
//!
//! The check runs against the full role set. [`AccessGuard`] re-reads the
//! identity from its source on every navigation; nothing is cached, so a
//! logout or a new login is visible on the very next call.

use opsdesk_core::Role;
use tracing::debug;

use crate::resolver::Identity;
use crate::routes::{Access, RouteRule, RouteTable};
use crate::session::IdentitySource;

/// Public login route.
pub const LOGIN_PATH: &str = "/login";

/// Public route shown when a session lacks the required role.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Render the view.
    Allow,
    /// No session: send the user to the login page.
    RedirectLogin,
    /// Valid session without a required role.
    RedirectUnauthorized,
}

impl Decision {
    /// Where to redirect, or `None` for [`Decision::Allow`].
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectLogin => Some(LOGIN_PATH),
            Self::RedirectUnauthorized => Some(UNAUTHORIZED_PATH),
        }
    }

    /// Whether the view may render.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `identity` may open a view requiring `required_roles`.
///
/// `Some(&[])` names no acceptable role and therefore always denies an
/// authenticated identity.
pub fn authorize(identity: Option<&Identity>, required_roles: Option<&[Role]>) -> Decision {
    let Some(identity) = identity else {
        return Decision::RedirectLogin;
    };
    match required_roles {
        None => Decision::Allow,
        Some(required) if identity.has_any_role(required) => Decision::Allow,
        Some(_) => Decision::RedirectUnauthorized,
    }
}

/// Result of navigating to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Render the matched route.
    Render(&'static RouteRule),
    /// Go elsewhere instead.
    Redirect(&'static str),
}

/// Route-level guard over an [`IdentitySource`].
pub struct AccessGuard<'a, I: IdentitySource + ?Sized> {
    source: &'a I,
    routes: &'a RouteTable,
}

impl<'a, I: IdentitySource + ?Sized> AccessGuard<'a, I> {
    /// Guard `routes` with identities read from `source`.
    pub fn new(source: &'a I, routes: &'a RouteTable) -> Self {
        Self { source, routes }
    }

    /// Resolve a navigation to `path`.
    ///
    /// Public routes always render. Unknown paths redirect to the login page.
    pub fn navigate(&self, path: &str) -> Navigation {
        let Some(rule) = self.routes.match_path(path) else {
            debug!(path, "no route matched; redirecting to login");
            return Navigation::Redirect(LOGIN_PATH);
        };

        if rule.access == Access::Public {
            return Navigation::Render(rule);
        }
        let identity = self.source.current_identity();
        let decision = authorize(identity.as_ref(), rule.access.required_roles());

        debug!(path, route = rule.path, ?decision, "access decision");
        match decision.redirect_path() {
            None => Navigation::Render(rule),
            Some(target) => Navigation::Redirect(target),
        }
    }

    /// Routes the current identity may open, for the navigation menu.
    pub fn menu(&self) -> Vec<&'static RouteRule> {
        match self.source.current_identity() {
            Some(identity) => self.routes.navigation(&identity),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Claims;
    use crate::resolver::resolve;
    use opsdesk_core::{Deployment, SubjectId};

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
    fn no_identity_redirects_to_login() {
        assert_eq!(authorize(None, None), Decision::RedirectLogin);
        assert_eq!(authorize(None, Some(&[Role::Admin])), Decision::RedirectLogin);
        assert_eq!(authorize(None, Some(&[])), Decision::RedirectLogin);
    }

    #[test]
    fn open_route_allows_any_identity() {
        let id = identity(&["docente"], Deployment::InnovationCenter);
        assert_eq!(authorize(Some(&id), None), Decision::Allow);
    }

    #[test]
    fn role_intersection_decides() {
        let gestor = identity(&["gestor"], Deployment::InnovationCenter);
        assert_eq!(authorize(Some(&gestor), Some(&[Role::Admin])), Decision::RedirectUnauthorized);
        assert_eq!(authorize(Some(&gestor), Some(&[Role::Gestor, Role::Admin])), Decision::Allow);
    }

    #[test]
    fn secondary_role_grants_access() {
        // Primary role is admin; docente access comes from the full role set.
        let id = identity(&["admin", "docente"], Deployment::InnovationCenter);
        assert_eq!(id.primary_role(), Role::Admin);
        assert_eq!(authorize(Some(&id), Some(&[Role::Docente])), Decision::Allow);
    }

    #[test]
    fn empty_requirement_denies() {
        let id = identity(&["admin"], Deployment::InnovationCenter);
        assert_eq!(authorize(Some(&id), Some(&[])), Decision::RedirectUnauthorized);
    }

    #[test]
    fn decision_redirect_paths() {
        assert_eq!(Decision::Allow.redirect_path(), None);
        assert_eq!(Decision::RedirectLogin.redirect_path(), Some("/login"));
        assert_eq!(Decision::RedirectUnauthorized.redirect_path(), Some("/unauthorized"));
    }

    #[test]
    fn guard_navigation() {
        let routes = RouteTable::for_deployment(Deployment::InnovationCenter);
        let session = Some(identity(&["docente"], Deployment::InnovationCenter));
        let guard = AccessGuard::new(&session, &routes);

        assert!(matches!(guard.navigate("/docente"), Navigation::Render(r) if r.path == "/docente"));
        assert!(matches!(guard.navigate("/dashboard"), Navigation::Render(_)));
        assert_eq!(guard.navigate("/gestor"), Navigation::Redirect(UNAUTHORIZED_PATH));
        assert_eq!(guard.navigate("/nowhere"), Navigation::Redirect(LOGIN_PATH));
        assert!(matches!(guard.navigate("/login"), Navigation::Render(_)));
    }

    #[test]
    fn guard_without_session() {
        let routes = RouteTable::for_deployment(Deployment::Clinic);
        let session: Option<Identity> = None;
        let guard = AccessGuard::new(&session, &routes);
        assert_eq!(guard.navigate("/dashboard"), Navigation::Redirect(LOGIN_PATH));
        assert_eq!(guard.navigate("/medico"), Navigation::Redirect(LOGIN_PATH));
        assert!(matches!(guard.navigate("/unauthorized"), Navigation::Render(_)));
        assert!(guard.menu().is_empty());
    }
}
