use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthUser, MaybeAuthUser, TokenService};
use crate::models::user::{normalize_email, LoginRequest, RegisterRequest};
use crate::models::{NewUser, ProfileUpdate, PublicProfile};
use crate::state::AppState;
use crate::store::EMAIL_TAKEN;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

/// Same text for unknown email and wrong password; only the status differs.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let email = normalize_email(&request.email);
    if state.users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let password_hash = hash_password(request.password, state.config.bcrypt_cost).await?;
    let user = state
        .users
        .create_user(NewUser {
            name: request.name.trim().to_string(),
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "User registered");
    Ok(created(PublicProfile::from(&user), "User registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Response), AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let user = state
        .users
        .find_user_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(|| AppError::NotFound(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(request.password, user.password_hash.clone()).await? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    let profile = PublicProfile::from(&user);
    let token = state.tokens.issue(&profile)?;

    info!(user_id = %user.id, "User logged in");
    Ok((
        jar.add(state.tokens.session_cookie(token)),
        success(profile, "Logged in"),
    ))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Response) {
    (
        jar.remove(TokenService::removal_cookie()),
        success(true, "Logged out"),
    )
}

/// `null` data for anonymous callers.
pub async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
) -> Result<Response, AppError> {
    let Some(caller) = caller else {
        return Ok(success(None::<PublicProfile>, "Not signed in"));
    };

    let user = state
        .users
        .find_user(caller.id)
        .await?
        .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))?;

    Ok(success(Some(PublicProfile::from(&user)), "Profile loaded"))
}

pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    jar: CookieJar,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<(CookieJar, Response), AppError> {
    let Json(update) = payload?;
    update.validate()?;

    let user = state
        .users
        .update_user(caller.id, update.normalized())
        .await?
        .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))?;

    // The token embeds the email, so reissue it
    let profile = PublicProfile::from(&user);
    let token = state.tokens.issue(&profile)?;

    info!(user_id = %user.id, "Profile updated");
    Ok((
        jar.add(state.tokens.session_cookie(token)),
        success(profile, "Profile updated"),
    ))
}
