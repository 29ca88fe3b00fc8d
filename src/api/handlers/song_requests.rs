//! Song request handlers: submission, listing and the status workflow.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, created_with, ok_empty, ok_with};
use crate::db::{SoftDelete, Store};
use crate::models::{CreateSongRequest, RequestStatus, SongRequest, SongRequestResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RequestListParams {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusChange {
    pub status: Option<String>,
}

fn parse_status(value: &str) -> Result<RequestStatus, ApiError> {
    value
        .parse::<RequestStatus>()
        .map_err(|e| ApiError::Validation(e.to_string()))
}

/// Load an active request the caller may move: its DJ, or staff.
fn request_for_dj(auth: &AuthUser, id: i32) -> Result<SongRequest, ApiError> {
    let request = auth
        .store
        .song_requests
        .find_by_id(id)?
        .ok_or_else(|| ApiError::NotFound(format!("SongRequest {}", id)))?;
    auth.require_owner_or_staff(Some(request.dj_id))?;
    Ok(request)
}

fn moved(request: &SongRequest) -> ApiResponse {
    ok_with("songRequest", SongRequestResponse::from(request))
}

/// POST /api/song-requests
pub async fn create_song_request(
    auth: AuthUser,
    Json(input): Json<CreateSongRequest>,
) -> Result<ApiResponse, ApiError> {
    let request = auth.store.song_requests.create(auth.user.id, &input)?;
    Ok(created_with("songRequest", SongRequestResponse::from(&request)))
}

/// GET /api/events/{id}/requests[?status=PENDING]
pub async fn list_event_requests(
    State(store): State<Store>,
    Path(event_id): Path<i32>,
    Query(params): Query<RequestListParams>,
) -> Result<ApiResponse, ApiError> {
    if store.events.find_by_id(event_id)?.is_none() {
        return Err(ApiError::NotFound(format!("Event {}", event_id)));
    }

    let requests = match params.status.as_deref() {
        Some(status) => store
            .song_requests
            .find_by_event_and_status(event_id, parse_status(status)?)?,
        None => store.song_requests.find_by_event(event_id)?,
    };

    let requests: Vec<SongRequestResponse> =
        requests.iter().map(SongRequestResponse::from).collect();
    Ok(ok_with("songRequests", requests))
}

/// POST /api/song-requests/{id}/status with `{"status": "PENDING"}`
pub async fn change_status(
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<StatusChange>,
) -> Result<ApiResponse, ApiError> {
    let target = body
        .status
        .as_deref()
        .ok_or_else(|| ApiError::Validation("Missing required field 'status'".into()))
        .and_then(parse_status)?;

    let mut request = request_for_dj(&auth, id)?;
    auth.store.lifecycle.change_state(&mut request, target)?;
    Ok(moved(&request))
}

/// POST /api/song-requests/{id}/reject
pub async fn reject_request(auth: AuthUser, Path(id): Path<i32>) -> Result<ApiResponse, ApiError> {
    let mut request = request_for_dj(&auth, id)?;
    auth.store.lifecycle.reject(&mut request)?;
    Ok(moved(&request))
}

/// POST /api/song-requests/{id}/start
pub async fn start_request(auth: AuthUser, Path(id): Path<i32>) -> Result<ApiResponse, ApiError> {
    let mut request = request_for_dj(&auth, id)?;
    auth.store.lifecycle.start_processing(&mut request)?;
    Ok(moved(&request))
}

/// POST /api/song-requests/{id}/expire
pub async fn expire_request(auth: AuthUser, Path(id): Path<i32>) -> Result<ApiResponse, ApiError> {
    let mut request = request_for_dj(&auth, id)?;
    auth.store.lifecycle.expire(&mut request)?;
    Ok(moved(&request))
}

/// POST /api/song-requests/{id}/play
pub async fn play_request(auth: AuthUser, Path(id): Path<i32>) -> Result<ApiResponse, ApiError> {
    let mut request = request_for_dj(&auth, id)?;
    auth.store.lifecycle.play(&mut request)?;
    Ok(moved(&request))
}

/// DELETE /api/song-requests/{id}
///
/// The requester, the DJ or staff may withdraw a request.
pub async fn delete_song_request(
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<ApiResponse, ApiError> {
    let request = auth
        .store
        .song_requests
        .find_by_id_including_inactive(id)?
        .ok_or_else(|| ApiError::NotFound(format!("SongRequest {}", id)))?;
    if request.user_id != auth.user.id {
        auth.require_owner_or_staff(Some(request.dj_id))?;
    }

    auth.store.song_requests.delete(id)?;
    Ok(ok_empty())
}
