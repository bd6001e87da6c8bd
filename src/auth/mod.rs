//! Credential tokens and the cookie that carries them.
//!
//! A login issues an HS256 JWT holding `{email, id}` plus issue and expiry times.
//! The token travels in the HttpOnly `token` cookie; [`extractor`] turns it back
//! into a caller identity on every request.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PublicProfile;
use crate::utils::error::AppError;

pub mod extractor;
pub mod password;

pub use extractor::{AuthUser, MaybeAuthUser};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    secure_cookies: bool,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration, secure_cookies: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
            secure_cookies,
        }
    }

    pub fn issue(&self, profile: &PublicProfile) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            email: profile.email.clone(),
            id: profile.id,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("failed to sign token: {e}")))
    }

    /// Rejects malformed, badly signed and expired tokens alike.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected credential token");
                AppError::AuthError("Invalid or expired token".to_string())
            })
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let max_age = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        Cookie::build((TOKEN_COOKIE, token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .path("/")
            .max_age(time::Duration::seconds(max_age))
            .build()
    }

    pub fn removal_cookie() -> Cookie<'static> {
        Cookie::build((TOKEN_COOKIE, "")).path("/").build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            b"0123456789abcdef0123456789abcdef",
            Duration::from_secs(3600),
            false,
        )
    }

    fn profile() -> PublicProfile {
        PublicProfile {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@x.com".into(),
        }
    }

    #[test]
    fn test_issued_token_resolves_to_same_identity() {
        let tokens = service();
        let profile = profile();

        let claims = tokens.verify(&tokens.issue(&profile).unwrap()).unwrap();
        assert_eq!(claims.id, profile.id);
        assert_eq!(claims.email, profile.email);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TokenService::new(
            b"another-secret-another-secret-xx",
            Duration::from_secs(3600),
            false,
        );
        let token = other.issue(&profile()).unwrap();

        assert!(matches!(service().verify(&token), Err(AppError::AuthError(_))));
        assert!(matches!(service().verify("garbage"), Err(AppError::AuthError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let profile = profile();
        let issued = Utc::now().timestamp() - 7200;
        let token = tokens
            .sign(&Claims {
                email: profile.email,
                id: profile.id,
                iat: issued,
                exp: issued + 60,
            })
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AppError::AuthError(_))));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = service().session_cookie("abc".into());
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }
}
