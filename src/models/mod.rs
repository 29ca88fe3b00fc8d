//! Domain models and their API request/response shapes.

pub mod dj_profile;
pub mod event;
pub mod image;
pub mod location;
pub mod song;
pub mod song_request;
pub mod user;

use std::fmt;
use std::str::FromStr;

pub use dj_profile::{CreateDjProfile, DjProfile, DjProfileResponse};
pub use event::{CreateEvent, Event, EventResponse, UpdateEvent};
pub use image::{ImageError, ImagePayload};
pub use location::{CreateLocation, Location, LocationResponse};
pub use song::{CreateSong, Song, SongResponse};
pub use song_request::{CreateSongRequest, RequestStatus, SongRequest, SongRequestResponse};
pub use user::{CreateUser, User, UserResponse};

/// Every soft-deletable entity, addressable by its route name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    DjProfile,
    Location,
    Event,
    Song,
    SongRequest,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::DjProfile,
        EntityKind::Location,
        EntityKind::Event,
        EntityKind::Song,
        EntityKind::SongRequest,
    ];

    /// Name used in URLs, e.g. `/api/admin/dj-profiles`.
    pub fn route_name(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::DjProfile => "dj-profiles",
            EntityKind::Location => "locations",
            EntityKind::Event => "events",
            EntityKind::Song => "songs",
            EntityKind::SongRequest => "song-requests",
        }
    }

    /// Human readable name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::DjProfile => "DjProfile",
            EntityKind::Location => "Location",
            EntityKind::Event => "Event",
            EntityKind::Song => "Song",
            EntityKind::SongRequest => "SongRequest",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.route_name() == s)
            .ok_or_else(|| format!("Unknown entity '{}'", s))
    }
}
