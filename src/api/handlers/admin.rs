//! Staff-only maintenance: listings that include inactive rows and bulk
//! soft deletion, addressed by entity route name.

use axum::{Json, extract::Path};
use serde::Deserialize;
use serde_json::Value;

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::response::{ApiResponse, ok_with};
use crate::db::Store;
use crate::models::{
    DjProfileResponse, EntityKind, EventResponse, LocationResponse, SongRequestResponse,
    SongResponse, UserResponse,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkDelete {
    pub ids: Vec<i32>,
}

fn entity_kind(name: &str) -> Result<EntityKind, ApiError> {
    name.parse::<EntityKind>().map_err(ApiError::NotFound)
}

/// Every row of `kind`, active or not, with its `is_active` flag.
fn list_including_inactive(store: &Store, kind: EntityKind) -> Result<Vec<Value>, ApiError> {
    fn rows<T, R: serde::Serialize>(
        items: Vec<T>,
        is_active: impl Fn(&T) -> bool,
        view: impl Fn(&T) -> R,
    ) -> Result<Vec<Value>, ApiError> {
        items
            .iter()
            .map(|item| {
                let mut value = serde_json::to_value(view(item)).map_err(|e| {
                    tracing::error!("Failed to serialize admin listing: {}", e);
                    ApiError::Internal
                })?;
                if let Value::Object(map) = &mut value {
                    map.insert("is_active".into(), Value::Bool(is_active(item)));
                }
                Ok(value)
            })
            .collect()
    }

    match kind {
        EntityKind::User => {
            let djs = store.dj_profiles.dj_user_ids()?;
            rows(
                store.users.find_all_including_inactive()?,
                |u| u.is_active,
                |u| UserResponse::new(u, djs.contains(&u.id)),
            )
        }
        EntityKind::DjProfile => rows(
            store.dj_profiles.find_all_including_inactive()?,
            |p| p.is_active,
            |p| DjProfileResponse::from(p),
        ),
        EntityKind::Location => rows(
            store.locations.find_all_including_inactive()?,
            |l| l.is_active,
            |l| LocationResponse::from(l),
        ),
        EntityKind::Event => rows(
            store.events.find_all_including_inactive()?,
            |e| e.is_active,
            |e| EventResponse::from(e),
        ),
        EntityKind::Song => rows(
            store.songs.find_all_including_inactive()?,
            |s| s.is_active,
            |s| SongResponse::from(s),
        ),
        EntityKind::SongRequest => rows(
            store.song_requests.find_all_including_inactive()?,
            |r| r.is_active,
            |r| SongRequestResponse::from(r),
        ),
    }
}

/// GET /api/admin/{entity}
pub async fn list_entities(
    auth: AuthUser,
    Path(entity): Path<String>,
) -> Result<ApiResponse, ApiError> {
    auth.require_staff()?;
    let kind = entity_kind(&entity)?;
    let items = list_including_inactive(&auth.store, kind)?;
    Ok(ok_with("entity", kind.route_name()).with("items", items))
}

/// POST /api/admin/{entity}/bulk-delete with `{"ids": [..]}`
pub async fn bulk_delete(
    auth: AuthUser,
    Path(entity): Path<String>,
    Json(body): Json<BulkDelete>,
) -> Result<ApiResponse, ApiError> {
    auth.require_staff()?;
    let kind = entity_kind(&entity)?;
    let matched = auth.store.bulk_delete(kind, &body.ids)?;
    Ok(ok_with("entity", kind.route_name()).with("deleted", matched))
}
