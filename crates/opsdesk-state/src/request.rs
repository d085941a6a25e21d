//! # Backend Requests
//!
//! Every mutation is checked locally first and only then described as a
//! backend call. The console never optimistically applies a change: the
//! returned entity is a preview, and the screen refetches after the call
//! succeeds.
//!
//! | Operation            | Method   | Path                             | Body                 |
//! |----------------------|----------|----------------------------------|----------------------|
//! | [`plan_transition`]  | `PATCH`  | `/{collection}/{id}/status`      | `{status, reason?}`  |
//! | [`plan_withdrawal`]  | `DELETE` | `/{collection}/{id}`             | none                 |
//! | [`plan_create`]      | `POST`   | `/{collection}`                  | draft                |
//! | [`list_request`]     | `GET`    | `/{collection}?estado=STATUS`    | none                 |
//!
//! Concurrent edits are settled by the backend, last write wins.

use opsdesk_core::Role;
use serde::{Deserialize, Serialize};

use crate::error::{TransitionRejected, WorkflowError};
use crate::workflow::{
    attempt_transition_as, attempt_withdrawal, can_create, EntityDraft, WorkflowEntity,
};

/// HTTP method of a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Partial update.
    Patch,
    /// Delete.
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A backend call to issue after a successful local check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API base.
    pub path: String,
    /// JSON body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl std::fmt::Display for MutationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(body) = &self.body {
            write!(f, " {body}")?;
        }
        Ok(())
    }
}

/// Body of the status sub-route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    /// Target status.
    pub status: S,
    /// Reason, for targets that carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl<S: std::fmt::Display> StatusChange<S> {
    /// The JSON body, built field by field so it cannot fail to encode.
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert("status".into(), self.status.to_string().into());
        if let Some(reason) = &self.reason {
            body.insert("reason".into(), reason.clone().into());
        }
        serde_json::Value::Object(body)
    }
}

/// Check a status change for an actor holding `roles` and describe the
/// backend call. Returns the previewed entity alongside the request.
pub fn plan_transition<E: WorkflowEntity>(
    entity: &E,
    target: E::Status,
    roles: &[Role],
    reason: Option<&str>,
) -> Result<(E, MutationRequest), TransitionRejected> {
    let next = attempt_transition_as(entity, target, roles, reason)?;
    let change = StatusChange {
        status: target,
        reason: reason.map(str::trim).filter(|r| !r.is_empty()).map(str::to_owned),
    };
    let request = MutationRequest {
        method: Method::Patch,
        path: format!("/{}/{}/status", E::COLLECTION, entity.id()),
        body: Some(change.to_body()),
    };
    Ok((next, request))
}

/// Check a withdrawal and describe the backend call.
pub fn plan_withdrawal<E: WorkflowEntity>(
    entity: &E,
    roles: &[Role],
) -> Result<MutationRequest, TransitionRejected> {
    attempt_withdrawal(entity, roles)?;
    Ok(MutationRequest {
        method: Method::Delete,
        path: format!("/{}/{}", E::COLLECTION, entity.id()),
        body: None,
    })
}

/// Check creation rights and draft invariants, then describe the backend
/// call.
pub fn plan_create<D: EntityDraft>(
    draft: &D,
    roles: &[Role],
) -> Result<MutationRequest, WorkflowError> {
    let collection = <D::Entity as WorkflowEntity>::COLLECTION;
    if !can_create::<D::Entity>(roles) {
        return Err(WorkflowError::CreationForbidden {
            roles: roles.to_vec(),
            collection,
        });
    }
    draft.validate()?;
    Ok(MutationRequest {
        method: Method::Post,
        path: format!("/{collection}"),
        body: Some(serde_json::to_value(draft)?),
    })
}

/// Describe a listing of family `E`, optionally filtered by status.
pub fn list_request<E: WorkflowEntity>(filter: Option<E::Status>) -> MutationRequest {
    let path = match filter {
        Some(status) => format!("/{}?estado={status}", E::COLLECTION),
        None => format!("/{}", E::COLLECTION),
    };
    MutationRequest {
        method: Method::Get,
        path,
        body: None,
    }
}
