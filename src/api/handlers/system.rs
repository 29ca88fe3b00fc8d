//! Liveness endpoint.

use axum::extract::State;

use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, ok_with};
use crate::db::Store;

/// GET /health
///
/// Answers once the database can be queried.
pub async fn health(State(store): State<Store>) -> Result<ApiResponse, ApiError> {
    let live_events = store.events.find_live(chrono::Utc::now().naive_utc())?.len();
    Ok(ok_with("liveEvents", live_events))
}
