//! # Identifier Newtypes
//!
//! References used by the console. Identifiers are minted by the backend
//! system of record (opaque strings such as document ids), so the console
//! never generates them; it only validates that they are non-empty.
//!
//! - [`SubjectId`] — a user principal (credential subject, requester,
//!   reviewer, physician).
//! - [`EntityRef`] — any backend record (reservation, appointment, resource,
//!   patient).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implements `Deserialize` for string newtypes by routing through `new()`,
/// so invalid values are rejected at deserialization time.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

fn non_empty(raw: String, kind: &'static str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyIdentifier { kind });
    }
    if trimmed.len() == raw.len() {
        Ok(raw)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Identifier of a user principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Build a subject id, trimming whitespace. Empty ids are rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        non_empty(raw.into(), "subject id").map(Self)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(SubjectId);

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a backend record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    /// Build an entity reference, trimming whitespace. Empty refs are rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        non_empty(raw.into(), "entity reference").map(Self)
    }

    /// The reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(EntityRef);

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
