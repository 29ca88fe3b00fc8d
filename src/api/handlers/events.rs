//! Event handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, created_with, ok_empty, ok_with};
use crate::db::{SoftDelete, Store};
use crate::models::{CreateEvent, Event, EventResponse, UpdateEvent};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventListParams {
    /// Only events hosted by this DJ.
    pub dj: Option<i32>,
    /// Only events running right now.
    pub live: Option<bool>,
}

fn load_event(store: &Store, id: i32) -> Result<Event, ApiError> {
    store
        .events
        .find_by_id(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Event {}", id)))
}

/// POST /api/events
///
/// The caller hosts the event unless staff names another DJ.
pub async fn create_event(
    auth: AuthUser,
    Json(input): Json<CreateEvent>,
) -> Result<ApiResponse, ApiError> {
    if input.dj_id.is_some_and(|id| id != auth.user.id) {
        auth.require_staff()?;
    }
    let input = CreateEvent {
        dj_id: input.dj_id.or(Some(auth.user.id)),
        ..input
    };

    let event = auth.store.events.create(&input)?;
    Ok(created_with("event", EventResponse::from(&event)))
}

/// GET /api/events[?dj=ID][&live=true]
pub async fn list_events(
    State(store): State<Store>,
    Query(params): Query<EventListParams>,
) -> Result<ApiResponse, ApiError> {
    let mut events = match params.dj {
        Some(dj_id) => store.events.find_by_dj(dj_id)?,
        None => store.events.find_all()?,
    };
    if params.live == Some(true) {
        let now = Utc::now().naive_utc();
        events.retain(|event| event.is_live_at(now));
    }

    let events: Vec<EventResponse> = events.iter().map(EventResponse::from).collect();
    Ok(ok_with("events", events))
}

/// GET /api/events/{id}
pub async fn get_event(
    State(store): State<Store>,
    Path(id): Path<i32>,
) -> Result<ApiResponse, ApiError> {
    let event = load_event(&store, id)?;
    Ok(ok_with("event", EventResponse::from(&event)))
}

/// PATCH /api/events/{id}
pub async fn update_event(
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(changes): Json<UpdateEvent>,
) -> Result<ApiResponse, ApiError> {
    let event = load_event(&auth.store, id)?;
    auth.require_owner_or_staff(Some(event.dj_id))?;
    if changes.dj_id.is_some_and(|dj_id| dj_id != auth.user.id) {
        auth.require_staff()?;
    }

    let event = auth.store.events.update(id, &changes)?;
    Ok(ok_with("event", EventResponse::from(&event)))
}

/// DELETE /api/events/{id}
pub async fn delete_event(auth: AuthUser, Path(id): Path<i32>) -> Result<ApiResponse, ApiError> {
    let event = auth
        .store
        .events
        .find_by_id_including_inactive(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Event {}", id)))?;
    auth.require_owner_or_staff(Some(event.dj_id))?;

    auth.store.events.delete(id)?;
    Ok(ok_empty())
}
