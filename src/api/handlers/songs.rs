//! Song catalogue handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, created_with, ok_empty, ok_with};
use crate::db::{SoftDelete, Store};
use crate::models::{CreateSong, SongResponse};

/// POST /api/songs
pub async fn create_song(
    auth: AuthUser,
    Json(input): Json<CreateSong>,
) -> Result<ApiResponse, ApiError> {
    let song = auth.store.songs.create(&input)?;
    Ok(created_with("song", SongResponse::from(&song)))
}

/// GET /api/songs
pub async fn list_songs(State(store): State<Store>) -> Result<ApiResponse, ApiError> {
    let songs: Vec<SongResponse> = store.songs.find_all()?.iter().map(SongResponse::from).collect();
    Ok(ok_with("songs", songs))
}

/// DELETE /api/songs/{id}
pub async fn delete_song(auth: AuthUser, Path(id): Path<i32>) -> Result<ApiResponse, ApiError> {
    auth.require_staff()?;
    auth.store.songs.delete(id)?;
    Ok(ok_empty())
}
