//! # Session Errors
//!
//! - [`DecodeError`] — the credential cannot be trusted. Always ends the
//!   session: the caller is logged out and the persisted token discarded.
//! - [`StoreError`] — the persisted token could not be read or written.
//! - [`SessionError`] — what `login`/`logout` report.
//!
//! An authenticated user lacking a role is not an error here; it is
//! [`Decision::RedirectUnauthorized`](crate::Decision::RedirectUnauthorized).

use std::path::PathBuf;

use opsdesk_core::{Deployment, Timestamp, ValidationError};
use thiserror::Error;

/// A credential failed structural decode, expiry, or role resolution.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The token is not three dot-separated segments.
    #[error("malformed token: expected 3 segments, found {0}")]
    SegmentCount(usize),

    /// The payload segment is empty.
    #[error("malformed token: empty payload segment")]
    EmptyPayload,

    /// The payload segment is not base64url.
    #[error("token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is valid JSON but not an object.
    #[error("token payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),

    /// The payload is not a JSON claims object.
    #[error("token payload is not a valid claims object: {0}")]
    Json(#[from] serde_json::Error),

    /// No usable subject identifier in the claims.
    #[error("token carries no subject identifier")]
    MissingSubject,

    /// An `exp`/`iat` claim is out of range.
    #[error("token carries an invalid timestamp: {0}")]
    InvalidTimestamp(#[source] ValidationError),

    /// The credential expired.
    #[error("token expired at {expired_at}")]
    Expired {
        /// The `exp` claim.
        expired_at: Timestamp,
    },

    /// The credential declares `roles: []`.
    #[error("token declares an empty role list")]
    EmptyRoleSet,

    /// None of the declared roles exist in the deployment.
    #[error("token declares no role known to the {deployment} deployment: {roles:?}")]
    UnrecognizedRoles {
        /// The deployment the session belongs to.
        deployment: Deployment,
        /// The raw role strings from the credential.
        roles: Vec<String>,
    },
}

/// Reading or writing the persisted token failed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("token store I/O at {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The storage key cannot name a file inside the state directory.
    #[error("invalid token store key {0:?}")]
    InvalidKey(String),
}

/// Failure of a session lifecycle operation.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The credential was rejected; the session has been reset.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Token persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
