//! # Validation Errors
//!
//! Construction-time failures for the foundational types. Every fallible
//! constructor in this crate returns [`ValidationError`] so callers can
//! convert it into their own error hierarchy with `#[from]`.

use thiserror::Error;

/// A value failed validation while constructing a core type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier was empty or whitespace only.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// Which identifier kind was being built.
        kind: &'static str,
    },

    /// A role name did not match any known role.
    #[error("unknown role {0:?}")]
    UnknownRole(String),

    /// A deployment name did not match any known deployment.
    #[error("unknown deployment {0:?}")]
    UnknownDeployment(String),

    /// A timestamp string or epoch value could not be interpreted.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
