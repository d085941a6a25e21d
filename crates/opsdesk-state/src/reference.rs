//! # Reference Fields
//!
//! The backend returns a reference either as a bare id or as the populated
//! document it points to:
//!
//! ```text
//! "recurso": "lab-1"
//! "recurso": { "_id": "lab-1", "nombre": "Laboratorio 1" }
//! ```
//!
//! Both collapse to the id. Other document fields are ignored; the
//! console refetches what it displays.

use opsdesk_core::{EntityRef, SubjectId, ValidationError};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A reference as it appears on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reference {
    Text(String),
    Number(serde_json::Number),
    Document(serde_json::Map<String, Value>),
}

impl Reference {
    fn into_id<E: serde::de::Error>(self) -> Result<String, E> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Number(number) => Ok(number.to_string()),
            Self::Document(mut document) => {
                match document.remove("_id").or_else(|| document.remove("id")) {
                    Some(Value::String(id)) => Ok(id),
                    Some(Value::Number(id)) => Ok(id.to_string()),
                    _ => Err(E::custom("referenced document carries no `_id`")),
                }
            }
        }
    }
}

/// An identifier type a reference field collapses to.
pub(crate) trait FromReference: Sized {
    fn from_reference(id: String) -> Result<Self, ValidationError>;
}

impl FromReference for EntityRef {
    fn from_reference(id: String) -> Result<Self, ValidationError> {
        EntityRef::new(id)
    }
}

impl FromReference for SubjectId {
    fn from_reference(id: String) -> Result<Self, ValidationError> {
        SubjectId::new(id)
    }
}

/// `deserialize_with` for a required reference field.
pub(crate) fn required<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromReference,
{
    let id = Reference::deserialize(d)?.into_id()?;
    T::from_reference(id).map_err(serde::de::Error::custom)
}

/// `deserialize_with` for an optional reference field. Pair with
/// `#[serde(default)]`.
pub(crate) fn optional<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromReference,
{
    match Option::<Reference>::deserialize(d)? {
        Some(reference) => T::from_reference(reference.into_id()?)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
