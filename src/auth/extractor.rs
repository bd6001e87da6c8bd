use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use super::TOKEN_COOKIE;
use crate::state::AppState;
use crate::utils::error::AppError;

/// The authenticated caller. Use as a handler argument to require a credential.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Owner-or-admin rule shared by every mutating endpoint.
    pub fn ensure_can_manage(&self, owner_id: Uuid, what: &str) -> Result<(), AppError> {
        if self.id == owner_id || self.is_admin {
            Ok(())
        } else {
            tracing::warn!(caller = %self.id, owner = %owner_id, "Ownership check failed");
            Err(AppError::Forbidden(format!("Only the owner may manage this {what}")))
        }
    }
}

/// The caller if a credential was presented. A missing (or blank) cookie is
/// anonymous, while a present but invalid one is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

fn credential(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = state.tokens.verify(token)?;
    Ok(AuthUser {
        is_admin: state.config.is_admin(&claims.email),
        id: claims.id,
        email: claims.email,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = credential(parts)
            .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))?;
        resolve(&token, state)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match credential(parts) {
            None => Ok(Self(None)),
            Some(token) => resolve(&token, state).map(|user| Self(Some(user))),
        }
    }
}
