//! Current admin identity, resolved once per request and passed explicitly
//! into every guarded data access function.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{actions::ActionError, state::AppState};

pub const SESSION_COOKIE: &str = "admin_session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminIdentity {
    pub id: Uuid,
    pub email: String,
}

/// Possibly anonymous session. Extraction never fails; guarded operations
/// call [`Session::require`].
#[derive(Debug, Clone, Default)]
pub struct Session(Option<AdminIdentity>);

impl Session {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn admin(identity: AdminIdentity) -> Self {
        Self(Some(identity))
    }

    pub fn identity(&self) -> Option<&AdminIdentity> {
        self.0.as_ref()
    }

    pub fn require(&self) -> Result<&AdminIdentity, ActionError> {
        self.0.as_ref().ok_or(ActionError::LoginRequired)
    }
}

/// Bearer token first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
    {
        return Some(bearer.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_headers(&parts.headers) else {
            return Ok(Session::anonymous());
        };

        let keys = JwtKeys::from_ref(state);
        let claims = match keys.verify_access(&token) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "ignoring invalid session token");
                return Ok(Session::anonymous());
            }
        };

        match state.store.find_user_by_id(claims.sub).await {
            Ok(Some(user)) => Ok(Session::admin(AdminIdentity {
                id: user.id,
                email: user.email,
            })),
            Ok(None) => {
                warn!(user_id = %claims.sub, "token for unknown user");
                Ok(Session::anonymous())
            }
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                Ok(Session::anonymous())
            }
        }
    }
}

/// Admin-only extractor. Rejects anonymous requests with the login redirect
/// before any later extractor reads the body.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ActionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = match Session::from_request_parts(parts, state).await {
            Ok(session) => session,
            Err(never) => match never {},
        };
        session.require()?;
        Ok(RequireAdmin(session))
    }
}
