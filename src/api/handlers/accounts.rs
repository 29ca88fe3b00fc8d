//! Registration, login/logout and the caller's own account.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, created_with, ok_empty, ok_with};
use crate::db::{SoftDelete, Store};
use crate::models::{CreateUser, UserResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/users
///
/// Open registration. Staff accounts are only created from the command line,
/// so `is_staff` in the body is ignored.
pub async fn register(
    State(store): State<Store>,
    Json(input): Json<CreateUser>,
) -> Result<ApiResponse, ApiError> {
    let input = CreateUser {
        is_staff: None,
        ..input
    };
    let user = store.users.create(&input)?;
    Ok(created_with("user", UserResponse::new(&user, false)))
}

/// POST /api/login
///
/// Exchange email and password for a token. The same token is returned
/// until the user logs out.
pub async fn login(
    State(store): State<Store>,
    Json(input): Json<LoginRequest>,
) -> Result<ApiResponse, ApiError> {
    let email = input
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Missing required field 'email'".into()))?;
    let password = input
        .password
        .ok_or_else(|| ApiError::Validation("Missing required field 'password'".into()))?;

    let user = store
        .users
        .find_by_email(&email)?
        .ok_or(ApiError::WrongCredentials)?;

    if !user.verify_password(&password) {
        tracing::debug!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::WrongCredentials);
    }

    let token = store.users.issue_token(user.id)?;
    let is_dj = store.dj_profiles.is_dj(user.id)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(ok_with("token", token).with("user", UserResponse::new(&user, is_dj)))
}

/// POST /api/logout
pub async fn logout(auth: AuthUser) -> Result<ApiResponse, ApiError> {
    auth.store.users.revoke_token(auth.user.id)?;
    tracing::info!(user_id = auth.user.id, "User logged out");
    Ok(ok_empty())
}

/// GET /api/me
pub async fn me(auth: AuthUser) -> Result<ApiResponse, ApiError> {
    let is_dj = auth.dj_profile()?.is_some();
    Ok(ok_with("user", UserResponse::new(&auth.user, is_dj)))
}

/// DELETE /api/me
///
/// Account closure: the user row is deactivated and its token revoked.
pub async fn close_account(auth: AuthUser) -> Result<ApiResponse, ApiError> {
    auth.store.users.revoke_token(auth.user.id)?;
    auth.store.users.delete(auth.user.id)?;
    tracing::info!(user_id = auth.user.id, "Account closed");
    Ok(ok_empty())
}
