//! Events: a DJ playing at a location over a time window.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::image::ImagePayload;

/// How long an event runs when no end is given.
pub const DEFAULT_EVENT_HOURS: i64 = 24;

/// An event. Times are stored as naive UTC.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub dj_id: i32,
    pub location_id: i32,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub image: Option<ImagePayload>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    /// Whether `now` falls inside the event window, bounds included.
    pub fn is_live_at(&self, now: NaiveDateTime) -> bool {
        self.start_at <= now && now <= self.end_at
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now().naive_utc())
    }
}

/// End of an event that was created without one. `None` when the start is
/// too close to the end of the representable range.
pub fn default_end(start: NaiveDateTime) -> Option<NaiveDateTime> {
    start.checked_add_signed(Duration::hours(DEFAULT_EVENT_HOURS))
}

/// Event creation input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateEvent {
    pub name: Option<String>,
    /// The API fills this with the caller when absent.
    pub dj_id: Option<i32>,
    pub location_id: Option<i32>,
    /// Defaults to now.
    pub start: Option<DateTime<Utc>>,
    /// Defaults to `start` + 24h.
    pub end: Option<DateTime<Utc>>,
    pub image: Option<ImagePayload>,
}

impl CreateEvent {
    pub fn new(name: &str, dj_id: i32, location_id: i32) -> Self {
        Self {
            name: Some(name.to_string()),
            dj_id: Some(dj_id),
            location_id: Some(location_id),
            ..Default::default()
        }
    }
}

/// Partial event update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub dj_id: Option<i32>,
    pub location_id: Option<i32>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Serialize, Clone)]
pub struct EventResponse {
    pub id: i32,
    pub name: String,
    pub dj_id: i32,
    pub location_id: i32,
    pub start: String,
    pub end: String,
    pub is_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

impl From<&Event> for EventResponse {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            dj_id: event.dj_id,
            location_id: event.location_id,
            start: event.start_at.and_utc().to_rfc3339(),
            end: event.end_at.and_utc().to_rfc3339(),
            is_live: event.is_live(),
            image: event.image.clone(),
        }
    }
}
