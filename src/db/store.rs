//! One handle over every repository, shared by the HTTP layer and the CLI.

use crate::db::DbPool;
use crate::db::repository::{
    DjProfileRepository, EventRepository, LocationRepository, SongRepository,
    SongRequestRepository, UserRepository,
};
use crate::db::soft_delete::SoftDelete;
use crate::error::StoreError;
use crate::lifecycle::RequestLifecycle;
use crate::models::EntityKind;

#[derive(Clone)]
pub struct Store {
    pub users: UserRepository,
    pub dj_profiles: DjProfileRepository,
    pub locations: LocationRepository,
    pub events: EventRepository,
    pub songs: SongRepository,
    pub song_requests: SongRequestRepository,
    pub lifecycle: RequestLifecycle,
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            dj_profiles: DjProfileRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            songs: SongRepository::new(pool.clone()),
            song_requests: SongRequestRepository::new(pool.clone()),
            lifecycle: RequestLifecycle::new(pool),
        }
    }

    /// The soft-delete capability of the repository backing `kind`.
    pub fn soft_delete_for(&self, kind: EntityKind) -> &dyn SoftDelete {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::DjProfile => &self.dj_profiles,
            EntityKind::Location => &self.locations,
            EntityKind::Event => &self.events,
            EntityKind::Song => &self.songs,
            EntityKind::SongRequest => &self.song_requests,
        }
    }

    pub fn delete(&self, kind: EntityKind, id: i32) -> Result<(), StoreError> {
        self.soft_delete_for(kind).delete(id)
    }

    pub fn bulk_delete(&self, kind: EntityKind, ids: &[i32]) -> Result<usize, StoreError> {
        let matched = self.soft_delete_for(kind).bulk_delete(ids)?;
        tracing::info!(entity = %kind, requested = ids.len(), matched, "Bulk delete");
        Ok(matched)
    }
}
