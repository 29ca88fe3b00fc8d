//! Location handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, created_with, ok_empty, ok_with};
use crate::db::{SoftDelete, Store};
use crate::models::{CreateLocation, LocationResponse};

/// POST /api/locations
pub async fn create_location(
    auth: AuthUser,
    Json(input): Json<CreateLocation>,
) -> Result<ApiResponse, ApiError> {
    let location = auth.store.locations.create(&input)?;
    Ok(created_with("location", LocationResponse::from(&location)))
}

/// GET /api/locations
pub async fn list_locations(State(store): State<Store>) -> Result<ApiResponse, ApiError> {
    let locations: Vec<LocationResponse> = store
        .locations
        .find_all()?
        .iter()
        .map(LocationResponse::from)
        .collect();
    Ok(ok_with("locations", locations))
}

/// DELETE /api/locations/{id}
///
/// Locations have no owner, so only staff may remove them.
pub async fn delete_location(auth: AuthUser, Path(id): Path<i32>) -> Result<ApiResponse, ApiError> {
    auth.require_staff()?;
    auth.store.locations.delete(id)?;
    Ok(ok_empty())
}
