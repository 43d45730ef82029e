//! Per-request principal resolution.
//!
//! Token issuance and verification are out of scope here; the deployment
//! fronts this service with a gateway that authenticates the caller and
//! forwards the identity in headers. This extractor turns those headers
//! into an [`AccessGuard`] the domain services consume.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{AccessGuard, Principal};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user's id (UUID).
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's role; `admin` grants admin rights.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Access guard for a single request.
///
/// Absent identity headers yield an anonymous guard; the services translate
/// that into Unauthorized where a principal is required.
#[derive(Debug, Clone, Copy)]
pub struct RequestGuard {
    principal: Option<Principal>,
}

impl RequestGuard {
    /// Creates a guard for a known principal (used by tests).
    pub fn for_principal(principal: Option<Principal>) -> Self {
        Self { principal }
    }
}

impl AccessGuard for RequestGuard {
    fn current_user(&self) -> Option<Principal> {
        self.principal
    }
}

impl<S> FromRequestParts<S> for RequestGuard
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Self { principal: None });
        };

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid {USER_ID_HEADER} header"))
            })?;

        let admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

        Ok(Self {
            principal: Some(Principal { user_id, admin }),
        })
    }
}
