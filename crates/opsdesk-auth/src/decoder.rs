//! # Credential Decoder
//!
//! Structural decode of compact `header.payload.signature` credentials.
//! Only the payload is interpreted. The signature segment may be empty and is
//! never checked: the console trusts transport integrity and the backend
//! verifies every request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use opsdesk_core::Timestamp;
use serde::Deserialize;
use serde_json::Value;

use crate::claims::{Claims, RawClaims};
use crate::error::DecodeError;

/// Decode a credential into claims without checking expiry.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }
    let payload = segments[1].trim_end_matches('=');
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject(json_kind(&value)));
    }
    let raw = RawClaims::deserialize(value)?;
    Claims::try_from(raw)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a credential and reject it if it is expired at `now`.
pub fn decode_at(token: &str, now: Timestamp) -> Result<Claims, DecodeError> {
    let claims = decode(token)?;
    match claims.expires_at {
        Some(expired_at) if claims.is_expired_at(now) => Err(DecodeError::Expired { expired_at }),
        _ => Ok(claims),
    }
}
