//! Songs that can be requested. Shared across users and events.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Song {
    pub id: i32,
    pub artist: String,
    pub name: String,
    pub spotify_url: String,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateSong {
    pub artist: Option<String>,
    pub name: Option<String>,
    pub spotify_url: Option<String>,
    /// Defaults to an empty string.
    pub image_url: Option<String>,
}

impl CreateSong {
    pub fn new(artist: &str, name: &str, spotify_url: &str) -> Self {
        Self {
            artist: Some(artist.to_string()),
            name: Some(name.to_string()),
            spotify_url: Some(spotify_url.to_string()),
            image_url: None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct SongResponse {
    pub id: i32,
    pub artist: String,
    pub name: String,
    pub spotify_url: String,
    pub image_url: String,
}

impl From<&Song> for SongResponse {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id,
            artist: song.artist.clone(),
            name: song.name.clone(),
            spotify_url: song.spotify_url.clone(),
            image_url: song.image_url.clone(),
        }
    }
}
