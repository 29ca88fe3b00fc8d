//! DJ profile handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, created_with, ok_empty, ok_with};
use crate::db::{SoftDelete, Store};
use crate::models::{CreateDjProfile, DjProfileResponse};

/// POST /api/dj-profiles
///
/// Makes the caller a DJ. For staff the body's `user_id` is taken as is:
/// a profile for that user, or a detached profile when it is absent or `null`.
pub async fn create_dj_profile(
    auth: AuthUser,
    Json(input): Json<CreateDjProfile>,
) -> Result<ApiResponse, ApiError> {
    let input = if auth.user.is_staff {
        input
    } else {
        if input.user_id.is_some_and(|id| id != auth.user.id) {
            return Err(ApiError::NotAuthorized);
        }
        CreateDjProfile {
            user_id: Some(auth.user.id),
            ..input
        }
    };

    let profile = auth.store.dj_profiles.create(&input)?;
    Ok(created_with("djProfile", DjProfileResponse::from(&profile)))
}

/// GET /api/dj-profiles
pub async fn list_dj_profiles(State(store): State<Store>) -> Result<ApiResponse, ApiError> {
    let profiles: Vec<DjProfileResponse> = store
        .dj_profiles
        .find_all()?
        .iter()
        .map(DjProfileResponse::from)
        .collect();
    Ok(ok_with("djProfiles", profiles))
}

/// DELETE /api/dj-profiles/{id}
pub async fn delete_dj_profile(
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<ApiResponse, ApiError> {
    let profile = auth
        .store
        .dj_profiles
        .find_by_id_including_inactive(id)?
        .ok_or_else(|| ApiError::NotFound(format!("DjProfile {}", id)))?;
    auth.require_owner_or_staff(profile.user_id)?;

    auth.store.dj_profiles.delete(id)?;
    Ok(ok_empty())
}
