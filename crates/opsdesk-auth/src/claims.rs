//! # Credential Claims
//!
//! The typed payload of a console credential. Issuers are not consistent
//! about naming, so the wire shape is read leniently and normalized:
//!
//! | Claim        | Accepted keys             | Notes                          |
//! |--------------|---------------------------|--------------------------------|
//! | subject      | `sub`, `userId`, `id`     | first present wins; numbers ok |
//! | single role  | `role`                    | string                         |
//! | role list    | `roles`                   | list of strings                |
//! | display name | `name`, `nombre`          | optional                       |
//! | email        | `email`                   | optional                       |
//! | expiry       | `exp`                     | UNIX seconds, optional         |
//! | issued at    | `iat`                     | UNIX seconds, optional         |

use opsdesk_core::{SubjectId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;

/// Decoded credential payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Subject identifier.
    pub subject: SubjectId,
    /// Single role claim, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Role list claim, if any. Takes precedence over `role`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiry instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    /// Issue instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<Timestamp>,
}

impl Claims {
    /// Whether the credential is expired at `now`. Credentials without `exp`
    /// never expire client-side.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Wire shape of the payload before normalization.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default, rename = "userId")]
    user_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default, alias = "nombre")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
}

impl TryFrom<RawClaims> for Claims {
    type Error = DecodeError;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let subject = [raw.sub, raw.user_id, raw.id]
            .into_iter()
            .flatten()
            .find_map(|value| subject_from_value(&value))
            .ok_or(DecodeError::MissingSubject)?;

        let expires_at = raw
            .exp
            .map(Timestamp::from_epoch_secs)
            .transpose()
            .map_err(DecodeError::InvalidTimestamp)?;
        let issued_at = raw
            .iat
            .map(Timestamp::from_epoch_secs)
            .transpose()
            .map_err(DecodeError::InvalidTimestamp)?;

        Ok(Claims {
            subject,
            role: raw.role,
            roles: raw.roles,
            name: raw.name.filter(|n| !n.trim().is_empty()),
            email: raw.email.filter(|e| !e.trim().is_empty()),
            expires_at,
            issued_at,
        })
    }
}

fn subject_from_value(value: &Value) -> Option<SubjectId> {
    match value {
        Value::String(s) => SubjectId::new(s.as_str()).ok(),
        Value::Number(n) => SubjectId::new(n.to_string()).ok(),
        _ => None,
    }
}
