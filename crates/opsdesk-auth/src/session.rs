//! # Session Store
//!
//! The only owner of the current [`Identity`]. Lifecycle:
//!
//! ```text
//!            init (persisted token decodes)      login(token) ok
//!   ┌──────────────────────────────┐   ┌─────────────────────────────┐
//!   │                              ▼   │                             ▼
//! Unauthenticated ◀──────────── Authenticated ◀──────────────── Authenticated
//!        ▲   logout / decode failure / expiry at read
//!        └── logout (no-op)
//! ```
//!
//! The whole `Option<Session>` is replaced under one write guard, so readers
//! see either the previous session or the next one, never a mix.
//!
//! Consumers should depend on [`IdentitySource`] rather than on
//! `SessionStore` itself; tests can then substitute a fixed identity.

use opsdesk_core::{Deployment, Timestamp};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::claims::Claims;
use crate::decoder::decode_at;
use crate::error::{DecodeError, SessionError};
use crate::resolver::{resolve, Identity};
use crate::store::TokenStore;

/// Anything that can report the current identity.
pub trait IdentitySource {
    /// The identity of the active session, or `None` when unauthenticated.
    fn current_identity(&self) -> Option<Identity>;
}

impl IdentitySource for Option<Identity> {
    fn current_identity(&self) -> Option<Identity> {
        self.clone()
    }
}

/// An authenticated session: the credential and what was derived from it.
#[derive(Debug, Clone)]
struct Session {
    token: String,
    claims: Claims,
    identity: Identity,
}

/// Process-wide session state over a persisted [`TokenStore`].
pub struct SessionStore<S: TokenStore> {
    deployment: Deployment,
    store: S,
    current: RwLock<Option<Session>>,
}

impl<S: TokenStore> SessionStore<S> {
    /// Start the store, restoring a persisted session if its token is valid now.
    pub fn init(store: S, deployment: Deployment) -> Self {
        Self::init_at(store, deployment, Timestamp::now())
    }

    /// [`init`](Self::init) with an explicit clock reading.
    ///
    /// A persisted token that fails to decode, has expired, or resolves to no
    /// role is cleared from the store. Storage read failures start the store
    /// unauthenticated.
    pub fn init_at(store: S, deployment: Deployment, now: Timestamp) -> Self {
        let restored = match store.load() {
            Ok(Some(token)) => match derive_session(&token, deployment, now) {
                Ok(session) => {
                    info!(
                        subject = %session.identity.subject_id(),
                        primary_role = %session.identity.primary_role(),
                        "restored persisted session"
                    );
                    Some(session)
                }
                Err(e) => {
                    warn!(error = %e, "discarding persisted token");
                    if let Err(clear_err) = store.clear() {
                        error!(error = %clear_err, "failed to clear persisted token");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "failed to read persisted token; starting unauthenticated");
                None
            }
        };

        Self {
            deployment,
            store,
            current: RwLock::new(restored),
        }
    }

    /// The deployment this store resolves roles for.
    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    /// Log in with a fresh credential.
    pub fn login(&self, token: &str) -> Result<Identity, SessionError> {
        self.login_at(token, Timestamp::now())
    }

    /// [`login`](Self::login) with an explicit clock reading.
    ///
    /// A credential that does not decode forces a logout before the error is
    /// returned. A valid credential is persisted and swapped in under the
    /// session write lock; if persistence fails the previous session stays in
    /// place.
    pub fn login_at(&self, token: &str, now: Timestamp) -> Result<Identity, SessionError> {
        let token = token.trim();
        let session = match derive_session(token, self.deployment, now) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "login rejected; resetting session");
                self.hard_reset();
                return Err(e.into());
            }
        };

        let identity = session.identity.clone();
        {
            let mut current = self.current.write();
            self.store.save(token)?;
            *current = Some(session);
        }

        info!(
            subject = %identity.subject_id(),
            primary_role = %identity.primary_role(),
            roles = ?identity.roles(),
            "login"
        );
        Ok(identity)
    }

    /// End the session. Logging out while logged out is a no-op.
    ///
    /// The in-memory session is cleared before the persisted token, so the
    /// identity is gone even if the store reports an error. Both happen under
    /// the session write lock.
    pub fn logout(&self) -> Result<(), SessionError> {
        let previous = {
            let mut current = self.current.write();
            let previous = current.take();
            self.store.clear()?;
            previous
        };
        match previous {
            Some(session) => info!(subject = %session.identity.subject_id(), "logout"),
            None => debug!("logout without active session"),
        }
        Ok(())
    }

    /// The current identity as of `now`.
    ///
    /// A session whose credential has expired by `now` is torn down and
    /// `None` is returned.
    pub fn current_identity_at(&self, now: Timestamp) -> Option<Identity> {
        let expired_token = {
            let guard = self.current.read();
            match guard.as_ref() {
                None => return None,
                Some(session) if session.claims.is_expired_at(now) => session.token.clone(),
                Some(session) => return Some(session.identity.clone()),
            }
        };

        let mut guard = self.current.write();
        if guard.as_ref().is_some_and(|s| s.token == expired_token) {
            *guard = None;
            if let Err(e) = self.store.clear() {
                error!(error = %e, "failed to clear expired token");
            }
            drop(guard);
            warn!("session credential expired; logging out");
            return None;
        }
        // Another login replaced the session between the two locks.
        guard.as_ref().map(|s| s.identity.clone())
    }

    /// The raw credential of the active session, for the `Authorization`
    /// header of backend calls.
    pub fn bearer_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.token.clone())
    }

    /// Decoded claims of the active session.
    pub fn claims(&self) -> Option<Claims> {
        self.current.read().as_ref().map(|s| s.claims.clone())
    }

    fn hard_reset(&self) {
        let mut current = self.current.write();
        *current = None;
        if let Err(e) = self.store.clear() {
            error!(error = %e, "failed to clear persisted token during reset");
        }
    }
}

impl<S: TokenStore> IdentitySource for SessionStore<S> {
    fn current_identity(&self) -> Option<Identity> {
        self.current_identity_at(Timestamp::now())
    }
}

impl<S: TokenStore> std::fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("deployment", &self.deployment)
            .field("authenticated", &self.current.read().is_some())
            .finish()
    }
}

fn derive_session(token: &str, deployment: Deployment, now: Timestamp) -> Result<Session, DecodeError> {
    let claims = decode_at(token, now)?;
    let identity = resolve(&claims, deployment)?;
    Ok(Session {
        token: token.to_string(),
        claims,
        identity,
    })
}
