//! Song request lifecycle engine.
//!
//! Status changes are checked against [`RequestStatus::can_transition_to`]
//! and written with a compare-and-set on the current status, so two callers
//! racing on the same request cannot both move it out of the same state.

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::db::repository::{load_song_request, parse_status};
use crate::db::schema::song_requests;
use crate::db::soft_delete::Visibility;
use crate::error::StoreError;
use crate::models::{RequestStatus, SongRequest};

/// Next value for `last_status_timestamp`: now, unless the clock has not
/// moved past the previous stamp.
fn next_timestamp(previous: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[derive(Clone)]
pub struct RequestLifecycle {
    pool: DbPool,
}

impl RequestLifecycle {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Move `request` to `target`.
    ///
    /// On success the stored row and `request` both carry the new status and
    /// a strictly later `last_status_timestamp`. On failure neither changes.
    /// If the stored status no longer matches `request.status`, the error
    /// reports the stored one.
    pub fn change_state(
        &self,
        request: &mut SongRequest,
        target: RequestStatus,
    ) -> Result<(), StoreError> {
        let from = request.status;
        if !from.can_transition_to(target) {
            tracing::warn!(request_id = request.id, %from, to = %target, "Rejected status transition");
            return Err(StoreError::InvalidTransition { from, to: target });
        }

        let stamp = next_timestamp(request.last_status_timestamp, Utc::now().naive_utc());
        let id = request.id;

        let mut conn = self.pool.get()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let updated = diesel::update(
                song_requests::table
                    .filter(song_requests::id.eq(id))
                    .filter(song_requests::status.eq(from.as_str()))
                    .filter(song_requests::is_active.eq(true)),
            )
            .set((
                song_requests::status.eq(target.as_str()),
                song_requests::last_status_timestamp.eq(stamp),
                song_requests::updated_at.eq(stamp),
            ))
            .execute(conn)?;

            if updated == 0 {
                let stored = song_requests::table
                    .filter(song_requests::id.eq(id))
                    .filter(song_requests::is_active.eq(true))
                    .select(song_requests::status)
                    .first::<String>(conn)
                    .optional()?;

                return Err(match stored {
                    Some(status) => StoreError::InvalidTransition {
                        from: parse_status(&status)?,
                        to: target,
                    },
                    None => StoreError::not_found("SongRequest", id),
                });
            }
            Ok(())
        })?;

        request.status = target;
        request.last_status_timestamp = stamp;
        request.updated_at = stamp;

        tracing::info!(request_id = id, %from, to = %target, "Song request status changed");
        Ok(())
    }

    /// Load an active request by id and move it to `target`.
    pub fn transition(&self, id: i32, target: RequestStatus) -> Result<SongRequest, StoreError> {
        let mut request = {
            let mut conn = self.pool.get()?;
            load_song_request(&mut conn, id, Visibility::ActiveOnly)?
                .ok_or_else(|| StoreError::not_found("SongRequest", id))?
        };
        self.change_state(&mut request, target)?;
        Ok(request)
    }

    pub fn reject(&self, request: &mut SongRequest) -> Result<(), StoreError> {
        self.change_state(request, RequestStatus::Rejected)
    }

    pub fn start_processing(&self, request: &mut SongRequest) -> Result<(), StoreError> {
        self.change_state(request, RequestStatus::Pending)
    }

    pub fn expire(&self, request: &mut SongRequest) -> Result<(), StoreError> {
        self.change_state(request, RequestStatus::Expired)
    }

    pub fn play(&self, request: &mut SongRequest) -> Result<(), StoreError> {
        self.change_state(request, RequestStatus::Played)
    }
}
