//! Token authentication.
//!
//! Clients log in with email and password and receive an opaque token. Every
//! authenticated request then carries it as:
//!
//! ```text
//! Authorization: Token <key>
//! ```
//!
//! `Bearer <key>` is accepted as well.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};

use super::error::ApiError;
use crate::db::Store;
use crate::models::{DjProfile, User};

/// Pull the token out of the `Authorization` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if (scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer"))
        && !token.is_empty()
    {
        Some(token)
    } else {
        None
    }
}

/// Authenticated user extractor.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> Result<ApiResponse, ApiError> {
///     // auth.user is an active account holding a valid token
///     // auth.store gives access to the repositories
/// }
/// ```
#[derive(Clone)]
pub struct AuthUser {
    pub user: User,
    pub store: Store,
}

impl AuthUser {
    /// The caller's active DJ profile, if any.
    pub fn dj_profile(&self) -> Result<Option<DjProfile>, ApiError> {
        Ok(self.store.dj_profiles.find_for_user(self.user.id)?)
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.user.is_staff {
            Ok(())
        } else {
            Err(ApiError::NotAuthorized)
        }
    }

    /// Allow the owner of a record, or staff.
    pub fn require_owner_or_staff(&self, owner_id: Option<i32>) -> Result<(), ApiError> {
        if self.user.is_staff || owner_id == Some(self.user.id) {
            Ok(())
        } else {
            Err(ApiError::NotAuthorized)
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Store: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(ApiError::NotAuthenticated)?;
        let store = Store::from_ref(state);

        let user = store
            .users
            .find_by_token(token)?
            .ok_or(ApiError::NotAuthenticated)?;

        Ok(AuthUser { user, store })
    }
}
