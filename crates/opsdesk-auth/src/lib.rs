//! # opsdesk-auth — Session Derivation and Access Control
//!
//! Turns a single opaque bearer credential into a trusted-for-UI identity and
//! gates every protected view against it.
//!
//! ```text
//! token ──▶ decoder::decode ──▶ resolver::resolve ──▶ SessionStore
//!                                                        │
//!                          AccessGuard::navigate ◀───────┘  (every navigation)
//! ```
//!
//! ## Modules
//!
//! - [`decoder`] — structural decode of `header.payload.signature` tokens
//!   into [`Claims`]. No signature verification; the backend owns that.
//! - [`resolver`] — [`Identity`] from claims: role extraction, deployment
//!   filtering, primary-role priority scan.
//! - [`session`] — [`SessionStore`], the sole owner of the current identity,
//!   with init/login/logout lifecycle and atomic replacement.
//! - [`store`] — [`TokenStore`] persistence of the one token value.
//! - [`guard`] — the [`authorize`] predicate and [`AccessGuard`].
//! - [`routes`] — per-deployment [`RouteTable`], menu, and landing routes.
//!
//! ## Trust Model
//!
//! Claims decoded here are a UI hint. They decide what the console offers,
//! never what the backend accepts; the backend re-validates the bearer token
//! on every request.

pub mod claims;
pub mod decoder;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod routes;
pub mod session;
pub mod store;

pub use claims::Claims;
pub use decoder::{decode, decode_at};
pub use error::{DecodeError, SessionError, StoreError};
pub use guard::{authorize, AccessGuard, Decision, Navigation, LOGIN_PATH, UNAUTHORIZED_PATH};
pub use resolver::{resolve, Identity};
pub use routes::{Access, RouteRule, RouteTable};
pub use session::{IdentitySource, SessionStore};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, DEFAULT_TOKEN_KEY};
