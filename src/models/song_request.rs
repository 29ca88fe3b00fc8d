//! Song requests and their status graph.
//!
//! Transition rules:
//! - `REQUESTED` -> `PENDING`, `REJECTED`
//! - `PENDING`   -> `PLAYED`, `EXPIRED`
//! - `PLAYED`, `REJECTED`, `EXPIRED` are terminal

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a song request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    #[default]
    Requested,
    Pending,
    Played,
    Rejected,
    Expired,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Requested,
        RequestStatus::Pending,
        RequestStatus::Played,
        RequestStatus::Rejected,
        RequestStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Requested => "REQUESTED",
            RequestStatus::Pending => "PENDING",
            RequestStatus::Played => "PLAYED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Expired => "EXPIRED",
        }
    }

    /// Statuses this one may move to.
    pub fn allowed_targets(self) -> &'static [RequestStatus] {
        match self {
            RequestStatus::Requested => &[RequestStatus::Rejected, RequestStatus::Pending],
            RequestStatus::Pending => &[RequestStatus::Expired, RequestStatus::Played],
            RequestStatus::Played | RequestStatus::Rejected | RequestStatus::Expired => &[],
        }
    }

    pub fn can_transition_to(self, target: RequestStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted status string is not a known status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown song request status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A request from an attendee for a DJ to play a song at an event.
#[derive(Debug, Clone)]
pub struct SongRequest {
    pub id: i32,
    pub song_id: i32,
    pub user_id: i32,
    pub dj_id: i32,
    pub event_id: i32,
    pub status: RequestStatus,
    pub last_status_timestamp: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Song request input. The requester comes from the session and the DJ from the event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateSongRequest {
    pub song_id: Option<i32>,
    pub event_id: Option<i32>,
}

impl CreateSongRequest {
    pub fn new(song_id: i32, event_id: i32) -> Self {
        Self {
            song_id: Some(song_id),
            event_id: Some(event_id),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct SongRequestResponse {
    pub id: i32,
    pub song_id: i32,
    pub user_id: i32,
    pub dj_id: i32,
    pub event_id: i32,
    pub status: RequestStatus,
    pub last_status_timestamp: String,
}

impl From<&SongRequest> for SongRequestResponse {
    fn from(request: &SongRequest) -> Self {
        Self {
            id: request.id,
            song_id: request.song_id,
            user_id: request.user_id,
            dj_id: request.dj_id,
            event_id: request.event_id,
            status: request.status,
            last_status_timestamp: request.last_status_timestamp.and_utc().to_rfc3339(),
        }
    }
}
