//! Database repositories for every entity.
//!
//! Reads go through the active-only path unless a method says
//! `including_inactive`. Deletion is provided by [`SoftDelete`].

use std::collections::HashSet;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::crypto::{generate_token, hash_password};
use crate::db::DbPool;
use crate::db::schema::{dj_profiles, events, locations, song_requests, songs, users};
use crate::db::soft_delete::{Visibility, impl_soft_delete};
use crate::error::{StoreError, required, required_text, unique_violation};
use crate::models::event::default_end;
use crate::models::user::normalize_email;
use crate::models::{
    CreateDjProfile, CreateEvent, CreateLocation, CreateSong, CreateSongRequest, CreateUser,
    DjProfile, Event, ImagePayload, Location, RequestStatus, Song, SongRequest, UpdateEvent, User,
};

/// Id of the row most recently inserted on this connection.
fn last_insert_id(conn: &mut SqliteConnection) -> QueryResult<i32> {
    diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>(
        "last_insert_rowid()",
    ))
    .get_result(conn)
}

/// Validate an optional embedded image before it is stored. Surrounding
/// whitespace is ignored here and trimmed from the stored content.
fn check_image(image: Option<&ImagePayload>, entity: &str) -> Result<(), StoreError> {
    if let Some(image) = image {
        image
            .decode()
            .map_err(|e| StoreError::validation(format!("Invalid image for {}: {}", entity, e)))?;
    }
    Ok(())
}

// ============================================================================
// Users
// ============================================================================

/// Database row representation for users.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub api_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            is_staff: row.is_staff,
            is_active: row.is_active,
            api_token: row.api_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Data for inserting a new user.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub is_staff: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn user_query(visibility: Visibility) -> users::BoxedQuery<'static, Sqlite> {
    match visibility {
        Visibility::ActiveOnly => users::table.filter(users::is_active.eq(true)).into_boxed(),
        Visibility::IncludeInactive => users::table.into_boxed(),
    }
}

fn load_user(
    conn: &mut SqliteConnection,
    id: i32,
    visibility: Visibility,
) -> QueryResult<Option<User>> {
    let row = user_query(visibility)
        .filter(users::id.eq(id))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(User::from))
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find an active user by ID.
    pub fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_user(&mut conn, user_id, Visibility::ActiveOnly)?)
    }

    pub fn find_by_id_including_inactive(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_user(&mut conn, user_id, Visibility::IncludeInactive)?)
    }

    /// Find an active user by email. The domain part is matched case-insensitively.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get()?;

        let row = user_query(Visibility::ActiveOnly)
            .filter(users::email.eq(normalize_email(email)))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(User::from))
    }

    /// Find the active user a login token was issued to.
    pub fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get()?;

        let row = user_query(Visibility::ActiveOnly)
            .filter(users::api_token.eq(token.to_string()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(User::from))
    }

    /// Get all active users.
    pub fn find_all(&self) -> Result<Vec<User>, StoreError> {
        self.find_all_with(Visibility::ActiveOnly)
    }

    pub fn find_all_including_inactive(&self) -> Result<Vec<User>, StoreError> {
        self.find_all_with(Visibility::IncludeInactive)
    }

    fn find_all_with(&self, visibility: Visibility) -> Result<Vec<User>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = user_query(visibility)
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Create a new user with a hashed password.
    ///
    /// Emails are unique across every stored row, active or not, so a closed
    /// account keeps its address.
    pub fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let email = normalize_email(&required_text(input.email.as_deref(), "User", "email")?);
        if !email.contains('@') {
            return Err(StoreError::validation(format!("Invalid email address '{}'", email)));
        }
        let name = required_text(input.name.as_deref(), "User", "name")?;
        let password = required(input.password.as_deref(), "User", "password")?;
        if password.is_empty() {
            return Err(StoreError::validation("Password must not be empty"));
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now().naive_utc();
        let new_user = NewUserRow {
            email: &email,
            name: &name,
            password_hash: &password_hash,
            is_staff: input.is_staff.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.get()?;
        let user = conn.transaction::<_, StoreError, _>(|conn| {
            let existing = users::table
                .filter(users::email.eq(&email))
                .count()
                .get_result::<i64>(conn)?;

            if existing > 0 {
                return Err(StoreError::UniquenessViolation {
                    entity: "User",
                    field: "email",
                });
            }

            diesel::insert_into(users::table)
                .values(&new_user)
                .execute(conn)
                .map_err(unique_violation("User", "email"))?;

            let id = last_insert_id(conn)?;
            load_user(conn, id, Visibility::IncludeInactive)?
                .ok_or_else(|| StoreError::not_found("User", id))
        })?;

        tracing::info!(user_id = user.id, is_staff = user.is_staff, "Created user");
        Ok(user)
    }

    /// Whether an active user with this email exists.
    pub fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_email(email)?.is_some())
    }

    /// Return the user's login token, issuing one if none is outstanding.
    pub fn issue_token(&self, user_id: i32) -> Result<String, StoreError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let user = load_user(conn, user_id, Visibility::ActiveOnly)?
                .ok_or_else(|| StoreError::not_found("User", user_id))?;

            if let Some(token) = user.api_token {
                return Ok(token);
            }

            let token = generate_token();
            diesel::update(users::table.filter(users::id.eq(user_id)))
                .set((
                    users::api_token.eq(Some(token.as_str())),
                    users::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            Ok(token)
        })
    }

    /// Clear the user's login token.
    pub fn revoke_token(&self, user_id: i32) -> Result<(), StoreError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(users::table.filter(users::id.eq(user_id)))
            .set(users::api_token.eq(None::<String>))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(StoreError::not_found("User", user_id));
        }
        Ok(())
    }
}

impl_soft_delete!(UserRepository, users, "User");

// ============================================================================
// DJ profiles
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = dj_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DjProfileRow {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub image: Option<String>,
    pub image_name: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<DjProfileRow> for DjProfile {
    fn from(row: DjProfileRow) -> Self {
        DjProfile {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            image: ImagePayload::from_columns(row.image, row.image_name),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = dj_profiles)]
pub struct NewDjProfileRow<'a> {
    pub user_id: Option<i32>,
    pub name: &'a str,
    pub image: Option<&'a str>,
    pub image_name: Option<&'a str>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn dj_profile_query(visibility: Visibility) -> dj_profiles::BoxedQuery<'static, Sqlite> {
    match visibility {
        Visibility::ActiveOnly => dj_profiles::table
            .filter(dj_profiles::is_active.eq(true))
            .into_boxed(),
        Visibility::IncludeInactive => dj_profiles::table.into_boxed(),
    }
}

fn load_dj_profile(
    conn: &mut SqliteConnection,
    id: i32,
    visibility: Visibility,
) -> QueryResult<Option<DjProfile>> {
    let row = dj_profile_query(visibility)
        .filter(dj_profiles::id.eq(id))
        .select(DjProfileRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(DjProfile::from))
}

/// The user's active DJ profile, if any.
fn active_profile_for_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> QueryResult<Option<DjProfile>> {
    let row = dj_profile_query(Visibility::ActiveOnly)
        .filter(dj_profiles::user_id.eq(user_id))
        .select(DjProfileRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(DjProfile::from))
}

/// Fail unless `user_id` is an active user with an active DJ profile.
fn ensure_dj(conn: &mut SqliteConnection, user_id: i32) -> Result<(), StoreError> {
    let user_active = load_user(conn, user_id, Visibility::ActiveOnly)?.is_some();
    if !user_active || active_profile_for_user(conn, user_id)?.is_none() {
        tracing::warn!(user_id, "Rejected event for a user without a DJ profile");
        return Err(StoreError::validation("user must be a DJ"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct DjProfileRepository {
    pool: DbPool,
}

impl DjProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_id(&self, id: i32) -> Result<Option<DjProfile>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_dj_profile(&mut conn, id, Visibility::ActiveOnly)?)
    }

    pub fn find_by_id_including_inactive(&self, id: i32) -> Result<Option<DjProfile>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_dj_profile(&mut conn, id, Visibility::IncludeInactive)?)
    }

    /// Explicit DJ lookup: a user is a DJ exactly when this returns a profile.
    pub fn find_for_user(&self, user_id: i32) -> Result<Option<DjProfile>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(active_profile_for_user(&mut conn, user_id)?)
    }

    pub fn is_dj(&self, user_id: i32) -> Result<bool, StoreError> {
        Ok(self.find_for_user(user_id)?.is_some())
    }

    /// Ids of every user holding an active profile.
    pub fn dj_user_ids(&self) -> Result<HashSet<i32>, StoreError> {
        let mut conn = self.pool.get()?;

        let ids = dj_profile_query(Visibility::ActiveOnly)
            .select(dj_profiles::user_id)
            .load::<Option<i32>>(&mut conn)?;

        Ok(ids.into_iter().flatten().collect())
    }

    pub fn find_all(&self) -> Result<Vec<DjProfile>, StoreError> {
        self.find_all_with(Visibility::ActiveOnly)
    }

    pub fn find_all_including_inactive(&self) -> Result<Vec<DjProfile>, StoreError> {
        self.find_all_with(Visibility::IncludeInactive)
    }

    fn find_all_with(&self, visibility: Visibility) -> Result<Vec<DjProfile>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = dj_profile_query(visibility)
            .order(dj_profiles::name.asc())
            .select(DjProfileRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(DjProfile::from).collect())
    }

    /// Create a profile. A user may hold at most one active profile; profile
    /// names are unique across all stored rows.
    pub fn create(&self, input: &CreateDjProfile) -> Result<DjProfile, StoreError> {
        let name = required_text(input.name.as_deref(), "DjProfile", "name")?;
        check_image(input.image.as_ref(), "DjProfile")?;

        let now = Utc::now().naive_utc();
        let new_profile = NewDjProfileRow {
            user_id: input.user_id,
            name: &name,
            image: input.image.as_ref().map(|i| i.content.trim()),
            image_name: input.image.as_ref().map(|i| i.name.as_str()),
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.get()?;
        let profile = conn.transaction::<_, StoreError, _>(|conn| {
            if let Some(user_id) = input.user_id {
                if load_user(conn, user_id, Visibility::ActiveOnly)?.is_none() {
                    return Err(StoreError::validation(format!(
                        "User {} does not exist",
                        user_id
                    )));
                }
                if active_profile_for_user(conn, user_id)?.is_some() {
                    return Err(StoreError::UniquenessViolation {
                        entity: "DjProfile",
                        field: "user",
                    });
                }
            }

            let name_taken = dj_profiles::table
                .filter(dj_profiles::name.eq(&name))
                .count()
                .get_result::<i64>(conn)?;
            if name_taken > 0 {
                return Err(StoreError::UniquenessViolation {
                    entity: "DjProfile",
                    field: "name",
                });
            }

            diesel::insert_into(dj_profiles::table)
                .values(&new_profile)
                .execute(conn)
                .map_err(unique_violation("DjProfile", "name"))?;

            let id = last_insert_id(conn)?;
            load_dj_profile(conn, id, Visibility::IncludeInactive)?
                .ok_or_else(|| StoreError::not_found("DjProfile", id))
        })?;

        tracing::info!(profile_id = profile.id, user_id = ?profile.user_id, "Created DJ profile");
        Ok(profile)
    }
}

impl_soft_delete!(DjProfileRepository, dj_profiles, "DjProfile");

// ============================================================================
// Locations
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = locations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LocationRow {
    pub id: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = locations)]
pub struct NewLocationRow<'a> {
    pub name: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn location_query(visibility: Visibility) -> locations::BoxedQuery<'static, Sqlite> {
    match visibility {
        Visibility::ActiveOnly => locations::table
            .filter(locations::is_active.eq(true))
            .into_boxed(),
        Visibility::IncludeInactive => locations::table.into_boxed(),
    }
}

fn load_location(
    conn: &mut SqliteConnection,
    id: i32,
    visibility: Visibility,
) -> QueryResult<Option<Location>> {
    let row = location_query(visibility)
        .filter(locations::id.eq(id))
        .select(LocationRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(Location::from))
}

#[derive(Clone)]
pub struct LocationRepository {
    pool: DbPool,
}

impl LocationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_id(&self, id: i32) -> Result<Option<Location>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_location(&mut conn, id, Visibility::ActiveOnly)?)
    }

    pub fn find_by_id_including_inactive(&self, id: i32) -> Result<Option<Location>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_location(&mut conn, id, Visibility::IncludeInactive)?)
    }

    pub fn find_all(&self) -> Result<Vec<Location>, StoreError> {
        self.find_all_with(Visibility::ActiveOnly)
    }

    pub fn find_all_including_inactive(&self) -> Result<Vec<Location>, StoreError> {
        self.find_all_with(Visibility::IncludeInactive)
    }

    fn find_all_with(&self, visibility: Visibility) -> Result<Vec<Location>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = location_query(visibility)
            .order(locations::name.asc())
            .select(LocationRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Location::from).collect())
    }

    /// Create a location. `(name, latitude, longitude)` is unique among active rows.
    pub fn create(&self, input: &CreateLocation) -> Result<Location, StoreError> {
        let name = required_text(input.name.as_deref(), "Location", "name")?;
        let latitude = required(input.latitude, "Location", "latitude")?;
        let longitude = required(input.longitude, "Location", "longitude")?;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(StoreError::validation(format!(
                "Latitude {} is out of range",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(StoreError::validation(format!(
                "Longitude {} is out of range",
                longitude
            )));
        }

        let now = Utc::now().naive_utc();
        let new_location = NewLocationRow {
            name: &name,
            latitude,
            longitude,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.get()?;
        let location = conn.transaction::<_, StoreError, _>(|conn| {
            diesel::insert_into(locations::table)
                .values(&new_location)
                .execute(conn)
                .map_err(unique_violation("Location", "name, latitude and longitude"))?;

            let id = last_insert_id(conn)?;
            load_location(conn, id, Visibility::IncludeInactive)?
                .ok_or_else(|| StoreError::not_found("Location", id))
        })?;

        tracing::info!(location_id = location.id, name = %location.name, "Created location");
        Ok(location)
    }
}

impl_soft_delete!(LocationRepository, locations, "Location");

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRow {
    pub id: i32,
    pub name: String,
    pub dj_id: i32,
    pub location_id: i32,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub image: Option<String>,
    pub image_name: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            name: row.name,
            dj_id: row.dj_id,
            location_id: row.location_id,
            start_at: row.start_at,
            end_at: row.end_at,
            image: ImagePayload::from_columns(row.image, row.image_name),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEventRow<'a> {
    pub name: &'a str,
    pub dj_id: i32,
    pub location_id: i32,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub image: Option<&'a str>,
    pub image_name: Option<&'a str>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Column values written back by an event update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = events)]
pub struct EventChangeset<'a> {
    pub name: &'a str,
    pub dj_id: i32,
    pub location_id: i32,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub image: Option<&'a str>,
    pub image_name: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

fn event_query(visibility: Visibility) -> events::BoxedQuery<'static, Sqlite> {
    match visibility {
        Visibility::ActiveOnly => events::table.filter(events::is_active.eq(true)).into_boxed(),
        Visibility::IncludeInactive => events::table.into_boxed(),
    }
}

fn load_event(
    conn: &mut SqliteConnection,
    id: i32,
    visibility: Visibility,
) -> QueryResult<Option<Event>> {
    let row = event_query(visibility)
        .filter(events::id.eq(id))
        .select(EventRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(Event::from))
}

fn check_event_window(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), StoreError> {
    if end < start {
        return Err(StoreError::validation("Event end must not precede its start"));
    }
    Ok(())
}

/// Fail unless the location is active and not already hosting another active event.
fn ensure_location_available(
    conn: &mut SqliteConnection,
    location_id: i32,
    except_event: Option<i32>,
) -> Result<(), StoreError> {
    if load_location(conn, location_id, Visibility::ActiveOnly)?.is_none() {
        return Err(StoreError::validation(format!(
            "Location {} does not exist",
            location_id
        )));
    }

    let mut query = event_query(Visibility::ActiveOnly)
        .filter(events::location_id.eq(location_id));
    if let Some(event_id) = except_event {
        query = query.filter(events::id.ne(event_id));
    }

    let taken = query
        .select(events::id)
        .first::<i32>(conn)
        .optional()?
        .is_some();

    if taken {
        return Err(StoreError::UniquenessViolation {
            entity: "Event",
            field: "location",
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct EventRepository {
    pool: DbPool,
}

impl EventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_id(&self, id: i32) -> Result<Option<Event>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_event(&mut conn, id, Visibility::ActiveOnly)?)
    }

    pub fn find_by_id_including_inactive(&self, id: i32) -> Result<Option<Event>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_event(&mut conn, id, Visibility::IncludeInactive)?)
    }

    /// Active events, soonest first.
    pub fn find_all(&self) -> Result<Vec<Event>, StoreError> {
        self.find_all_with(Visibility::ActiveOnly)
    }

    pub fn find_all_including_inactive(&self) -> Result<Vec<Event>, StoreError> {
        self.find_all_with(Visibility::IncludeInactive)
    }

    fn find_all_with(&self, visibility: Visibility) -> Result<Vec<Event>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = event_query(visibility)
            .order((events::start_at.asc(), events::id.asc()))
            .select(EventRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Active events hosted by one DJ.
    pub fn find_by_dj(&self, dj_id: i32) -> Result<Vec<Event>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = event_query(Visibility::ActiveOnly)
            .filter(events::dj_id.eq(dj_id))
            .order(events::start_at.asc())
            .select(EventRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Active events whose window contains `now`.
    pub fn find_live(&self, now: NaiveDateTime) -> Result<Vec<Event>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = event_query(Visibility::ActiveOnly)
            .filter(events::start_at.le(now))
            .filter(events::end_at.ge(now))
            .order(events::start_at.asc())
            .select(EventRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Create an event.
    ///
    /// The start defaults to now and the end to 24 hours after the start. The
    /// DJ must hold an active profile; nothing is written otherwise.
    pub fn create(&self, input: &CreateEvent) -> Result<Event, StoreError> {
        let name = required_text(input.name.as_deref(), "Event", "name")?;
        let dj_id = required(input.dj_id, "Event", "dj_id")?;
        let location_id = required(input.location_id, "Event", "location_id")?;
        check_image(input.image.as_ref(), "Event")?;

        let now = Utc::now().naive_utc();
        let start_at = input.start.map(|s| s.naive_utc()).unwrap_or(now);
        let end_at = match input.end {
            Some(end) => end.naive_utc(),
            None => default_end(start_at)
                .ok_or_else(|| StoreError::validation("Event start is out of range"))?,
        };
        check_event_window(start_at, end_at)?;

        let new_event = NewEventRow {
            name: &name,
            dj_id,
            location_id,
            start_at,
            end_at,
            image: input.image.as_ref().map(|i| i.content.trim()),
            image_name: input.image.as_ref().map(|i| i.name.as_str()),
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.get()?;
        let event = conn.transaction::<_, StoreError, _>(|conn| {
            ensure_dj(conn, dj_id)?;
            ensure_location_available(conn, location_id, None)?;

            diesel::insert_into(events::table)
                .values(&new_event)
                .execute(conn)
                .map_err(unique_violation("Event", "location"))?;

            let id = last_insert_id(conn)?;
            load_event(conn, id, Visibility::IncludeInactive)?
                .ok_or_else(|| StoreError::not_found("Event", id))
        })?;

        tracing::info!(event_id = event.id, dj_id, location_id, "Created event");
        Ok(event)
    }

    /// Apply a partial update to an active event. The DJ check runs again on
    /// every save, so an event whose DJ has since lost their profile cannot be
    /// edited until it is reassigned.
    pub fn update(&self, id: i32, changes: &UpdateEvent) -> Result<Event, StoreError> {
        if let Some(name) = changes.name.as_deref() {
            if name.trim().is_empty() {
                return Err(StoreError::validation("Event name must not be blank"));
            }
        }
        check_image(changes.image.as_ref(), "Event")?;

        let mut conn = self.pool.get()?;
        let event = conn.transaction::<_, StoreError, _>(|conn| {
            let current = load_event(conn, id, Visibility::ActiveOnly)?
                .ok_or_else(|| StoreError::not_found("Event", id))?;

            let name = changes
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or(current.name.as_str());
            let dj_id = changes.dj_id.unwrap_or(current.dj_id);
            let location_id = changes.location_id.unwrap_or(current.location_id);
            let start_at = changes.start.map(|s| s.naive_utc()).unwrap_or(current.start_at);
            let end_at = changes.end.map(|e| e.naive_utc()).unwrap_or(current.end_at);
            let image = changes.image.as_ref().or(current.image.as_ref());

            check_event_window(start_at, end_at)?;
            ensure_dj(conn, dj_id)?;
            if location_id != current.location_id {
                ensure_location_available(conn, location_id, Some(id))?;
            }

            diesel::update(events::table.filter(events::id.eq(id)))
                .set(&EventChangeset {
                    name,
                    dj_id,
                    location_id,
                    start_at,
                    end_at,
                    image: image.map(|i| i.content.trim()),
                    image_name: image.map(|i| i.name.as_str()),
                    updated_at: Utc::now().naive_utc(),
                })
                .execute(conn)
                .map_err(unique_violation("Event", "location"))?;

            load_event(conn, id, Visibility::IncludeInactive)?
                .ok_or_else(|| StoreError::not_found("Event", id))
        })?;

        tracing::info!(event_id = event.id, "Updated event");
        Ok(event)
    }
}

impl_soft_delete!(EventRepository, events, "Event");

// ============================================================================
// Songs
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = songs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SongRow {
    pub id: i32,
    pub artist: String,
    pub name: String,
    pub spotify_url: String,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Song {
            id: row.id,
            artist: row.artist,
            name: row.name,
            spotify_url: row.spotify_url,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = songs)]
pub struct NewSongRow<'a> {
    pub artist: &'a str,
    pub name: &'a str,
    pub spotify_url: &'a str,
    pub image_url: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn song_query(visibility: Visibility) -> songs::BoxedQuery<'static, Sqlite> {
    match visibility {
        Visibility::ActiveOnly => songs::table.filter(songs::is_active.eq(true)).into_boxed(),
        Visibility::IncludeInactive => songs::table.into_boxed(),
    }
}

fn load_song(
    conn: &mut SqliteConnection,
    id: i32,
    visibility: Visibility,
) -> QueryResult<Option<Song>> {
    let row = song_query(visibility)
        .filter(songs::id.eq(id))
        .select(SongRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(Song::from))
}

#[derive(Clone)]
pub struct SongRepository {
    pool: DbPool,
}

impl SongRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_id(&self, id: i32) -> Result<Option<Song>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_song(&mut conn, id, Visibility::ActiveOnly)?)
    }

    pub fn find_by_id_including_inactive(&self, id: i32) -> Result<Option<Song>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_song(&mut conn, id, Visibility::IncludeInactive)?)
    }

    pub fn find_all(&self) -> Result<Vec<Song>, StoreError> {
        self.find_all_with(Visibility::ActiveOnly)
    }

    pub fn find_all_including_inactive(&self) -> Result<Vec<Song>, StoreError> {
        self.find_all_with(Visibility::IncludeInactive)
    }

    fn find_all_with(&self, visibility: Visibility) -> Result<Vec<Song>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = song_query(visibility)
            .order((songs::artist.asc(), songs::name.asc()))
            .select(SongRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Song::from).collect())
    }

    /// Create a song. The Spotify URL is unique across all stored rows.
    pub fn create(&self, input: &CreateSong) -> Result<Song, StoreError> {
        let artist = required_text(input.artist.as_deref(), "Song", "artist")?;
        let name = required_text(input.name.as_deref(), "Song", "name")?;
        let spotify_url = required_text(input.spotify_url.as_deref(), "Song", "spotify_url")?;
        let image_url = input.image_url.as_deref().map(str::trim).unwrap_or("");

        let now = Utc::now().naive_utc();
        let new_song = NewSongRow {
            artist: &artist,
            name: &name,
            spotify_url: &spotify_url,
            image_url,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.get()?;
        let song = conn.transaction::<_, StoreError, _>(|conn| {
            diesel::insert_into(songs::table)
                .values(&new_song)
                .execute(conn)
                .map_err(unique_violation("Song", "spotify_url"))?;

            let id = last_insert_id(conn)?;
            load_song(conn, id, Visibility::IncludeInactive)?
                .ok_or_else(|| StoreError::not_found("Song", id))
        })?;

        tracing::info!(song_id = song.id, artist = %song.artist, name = %song.name, "Created song");
        Ok(song)
    }
}

impl_soft_delete!(SongRepository, songs, "Song");

// ============================================================================
// Song requests
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = song_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SongRequestRow {
    pub id: i32,
    pub song_id: i32,
    pub user_id: i32,
    pub dj_id: i32,
    pub event_id: i32,
    pub status: String,
    pub last_status_timestamp: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<SongRequestRow> for SongRequest {
    type Error = StoreError;

    fn try_from(row: SongRequestRow) -> Result<Self, Self::Error> {
        Ok(SongRequest {
            id: row.id,
            song_id: row.song_id,
            user_id: row.user_id,
            dj_id: row.dj_id,
            event_id: row.event_id,
            status: parse_status(&row.status)?,
            last_status_timestamp: row.last_status_timestamp,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Parse a stored status column.
pub(crate) fn parse_status(value: &str) -> Result<RequestStatus, StoreError> {
    value
        .parse::<RequestStatus>()
        .map_err(|e| StoreError::validation(e.to_string()))
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = song_requests)]
pub struct NewSongRequestRow<'a> {
    pub song_id: i32,
    pub user_id: i32,
    pub dj_id: i32,
    pub event_id: i32,
    pub status: &'a str,
    pub last_status_timestamp: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn song_request_query(visibility: Visibility) -> song_requests::BoxedQuery<'static, Sqlite> {
    match visibility {
        Visibility::ActiveOnly => song_requests::table
            .filter(song_requests::is_active.eq(true))
            .into_boxed(),
        Visibility::IncludeInactive => song_requests::table.into_boxed(),
    }
}

pub(crate) fn load_song_request(
    conn: &mut SqliteConnection,
    id: i32,
    visibility: Visibility,
) -> Result<Option<SongRequest>, StoreError> {
    let row = song_request_query(visibility)
        .filter(song_requests::id.eq(id))
        .select(SongRequestRow::as_select())
        .first(conn)
        .optional()?;

    row.map(SongRequest::try_from).transpose()
}

#[derive(Clone)]
pub struct SongRequestRepository {
    pool: DbPool,
}

impl SongRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn find_by_id(&self, id: i32) -> Result<Option<SongRequest>, StoreError> {
        let mut conn = self.pool.get()?;
        load_song_request(&mut conn, id, Visibility::ActiveOnly)
    }

    pub fn find_by_id_including_inactive(&self, id: i32) -> Result<Option<SongRequest>, StoreError> {
        let mut conn = self.pool.get()?;
        load_song_request(&mut conn, id, Visibility::IncludeInactive)
    }

    /// Active requests for an event, oldest first.
    pub fn find_by_event(&self, event_id: i32) -> Result<Vec<SongRequest>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = song_request_query(Visibility::ActiveOnly)
            .filter(song_requests::event_id.eq(event_id))
            .order(song_requests::id.asc())
            .select(SongRequestRow::as_select())
            .load(&mut conn)?;

        rows.into_iter().map(SongRequest::try_from).collect()
    }

    /// Active requests for an event currently in `status`, oldest transition first.
    pub fn find_by_event_and_status(
        &self,
        event_id: i32,
        status: RequestStatus,
    ) -> Result<Vec<SongRequest>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = song_request_query(Visibility::ActiveOnly)
            .filter(song_requests::event_id.eq(event_id))
            .filter(song_requests::status.eq(status.as_str()))
            .order(song_requests::last_status_timestamp.asc())
            .select(SongRequestRow::as_select())
            .load(&mut conn)?;

        rows.into_iter().map(SongRequest::try_from).collect()
    }

    pub fn find_all(&self) -> Result<Vec<SongRequest>, StoreError> {
        self.find_all_with(Visibility::ActiveOnly)
    }

    pub fn find_all_including_inactive(&self) -> Result<Vec<SongRequest>, StoreError> {
        self.find_all_with(Visibility::IncludeInactive)
    }

    fn find_all_with(&self, visibility: Visibility) -> Result<Vec<SongRequest>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = song_request_query(visibility)
            .order(song_requests::id.asc())
            .select(SongRequestRow::as_select())
            .load(&mut conn)?;

        rows.into_iter().map(SongRequest::try_from).collect()
    }

    /// Record a request from `user_id`. It starts `REQUESTED` and is addressed
    /// to the event's DJ.
    pub fn create(&self, user_id: i32, input: &CreateSongRequest) -> Result<SongRequest, StoreError> {
        let song_id = required(input.song_id, "SongRequest", "song_id")?;
        let event_id = required(input.event_id, "SongRequest", "event_id")?;

        let mut conn = self.pool.get()?;
        let request = conn.transaction::<_, StoreError, _>(|conn| {
            if load_user(conn, user_id, Visibility::ActiveOnly)?.is_none() {
                return Err(StoreError::validation(format!("User {} does not exist", user_id)));
            }
            if load_song(conn, song_id, Visibility::ActiveOnly)?.is_none() {
                return Err(StoreError::validation(format!("Song {} does not exist", song_id)));
            }
            let event = load_event(conn, event_id, Visibility::ActiveOnly)?.ok_or_else(|| {
                StoreError::validation(format!("Event {} does not exist", event_id))
            })?;

            let now = Utc::now().naive_utc();
            diesel::insert_into(song_requests::table)
                .values(&NewSongRequestRow {
                    song_id,
                    user_id,
                    dj_id: event.dj_id,
                    event_id,
                    status: RequestStatus::default().as_str(),
                    last_status_timestamp: now,
                    created_at: now,
                    updated_at: now,
                })
                .execute(conn)?;

            let id = last_insert_id(conn)?;
            load_song_request(conn, id, Visibility::IncludeInactive)?
                .ok_or_else(|| StoreError::not_found("SongRequest", id))
        })?;

        tracing::info!(
            request_id = request.id,
            song_id,
            event_id,
            user_id,
            "Created song request"
        );
        Ok(request)
    }
}

impl_soft_delete!(SongRequestRepository, song_requests, "SongRequest");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::{DbConfig, setup_database};
    use crate::db::soft_delete::SoftDelete;

    fn pool() -> DbPool {
        setup_database(&DbConfig::in_memory()).unwrap()
    }

    fn user(pool: &DbPool, email: &str) -> User {
        UserRepository::new(pool.clone())
            .create(&CreateUser::new(email, "Someone", "hunter22"))
            .unwrap()
    }

    fn dj(pool: &DbPool, email: &str, name: &str) -> User {
        let user = user(pool, email);
        DjProfileRepository::new(pool.clone())
            .create(&CreateDjProfile {
                user_id: Some(user.id),
                name: Some(name.to_string()),
                image: None,
            })
            .unwrap();
        user
    }

    #[test]
    fn test_user_create_and_lookup() {
        let pool = pool();
        let repo = UserRepository::new(pool.clone());
        let created = user(&pool, "Mo@Example.COM");

        assert_eq!(created.email, "Mo@example.com");
        assert!(created.is_active);
        assert!(!created.is_staff);
        assert!(created.verify_password("hunter22"));

        let found = repo.find_by_email("Mo@EXAMPLE.com").unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn test_user_email_is_unique() {
        let pool = pool();
        user(&pool, "mo@example.com");
        let err = UserRepository::new(pool)
            .create(&CreateUser::new("mo@example.com", "Other", "pw"))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniquenessViolation { entity: "User", field: "email" }
        ));
    }

    #[test]
    fn test_user_missing_fields_are_named() {
        let repo = UserRepository::new(pool());
        let err = repo
            .create(&CreateUser {
                email: Some("x@example.com".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_token_issue_reuse_and_revoke() {
        let pool = pool();
        let repo = UserRepository::new(pool.clone());
        let u = user(&pool, "mo@example.com");

        let token = repo.issue_token(u.id).unwrap();
        assert_eq!(repo.issue_token(u.id).unwrap(), token);
        assert_eq!(repo.find_by_token(&token).unwrap().unwrap().id, u.id);

        repo.revoke_token(u.id).unwrap();
        assert!(repo.find_by_token(&token).unwrap().is_none());
    }

    #[test]
    fn test_deleted_user_cannot_be_found_by_token() {
        let pool = pool();
        let repo = UserRepository::new(pool.clone());
        let u = user(&pool, "mo@example.com");
        let token = repo.issue_token(u.id).unwrap();

        repo.delete(u.id).unwrap();

        assert!(repo.find_by_token(&token).unwrap().is_none());
        assert!(repo.find_by_id(u.id).unwrap().is_none());
        let stored = repo.find_by_id_including_inactive(u.id).unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[test]
    fn test_is_dj_follows_active_profile() {
        let pool = pool();
        let profiles = DjProfileRepository::new(pool.clone());
        let plain = user(&pool, "fan@example.com");
        let spinner = dj(&pool, "dj@example.com", "DJ Spinner");

        assert!(!profiles.is_dj(plain.id).unwrap());
        assert!(profiles.is_dj(spinner.id).unwrap());

        let profile = profiles.find_for_user(spinner.id).unwrap().unwrap();
        profiles.delete(profile.id).unwrap();
        assert!(!profiles.is_dj(spinner.id).unwrap());
    }

    #[test]
    fn test_one_active_profile_per_user() {
        let pool = pool();
        let profiles = DjProfileRepository::new(pool.clone());
        let spinner = dj(&pool, "dj@example.com", "DJ Spinner");

        let second = CreateDjProfile {
            user_id: Some(spinner.id),
            name: Some("DJ Other".into()),
            image: None,
        };
        assert!(matches!(
            profiles.create(&second).unwrap_err(),
            StoreError::UniquenessViolation { field: "user", .. }
        ));

        let first = profiles.find_for_user(spinner.id).unwrap().unwrap();
        profiles.delete(first.id).unwrap();
        let replacement = profiles.create(&second).unwrap();
        assert_eq!(replacement.user_id, Some(spinner.id));
    }

    #[test]
    fn test_detached_profile_with_image() {
        let profiles = DjProfileRepository::new(pool());
        let image = ImagePayload::from_bytes("face.png", b"\x89PNG");
        let profile = profiles
            .create(&CreateDjProfile {
                user_id: None,
                name: Some("Ghost".into()),
                image: Some(image.clone()),
            })
            .unwrap();

        assert_eq!(profile.user_id, None);
        assert_eq!(profile.image, Some(image));
    }

    #[test]
    fn test_image_is_stored_as_checked() {
        let profiles = DjProfileRepository::new(pool());
        let image = ImagePayload::from_bytes("face.png", b"\x89PNG");
        let padded = ImagePayload {
            content: format!("  {}\n", image.content),
            name: image.name.clone(),
        };

        let profile = profiles
            .create(&CreateDjProfile {
                user_id: None,
                name: Some("Ghost".into()),
                image: Some(padded),
            })
            .unwrap();

        let stored = profiles.find_by_id(profile.id).unwrap().unwrap();
        assert_eq!(stored.image, Some(image));
    }

    #[test]
    fn test_invalid_image_is_a_validation_error() {
        let profiles = DjProfileRepository::new(pool());
        let err = profiles
            .create(&CreateDjProfile {
                user_id: None,
                name: Some("Ghost".into()),
                image: Some(ImagePayload {
                    content: "***".into(),
                    name: "bad.png".into(),
                }),
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_duplicate_active_location_then_after_delete() {
        let repo = LocationRepository::new(pool());
        let input = CreateLocation::new("Warehouse", 52.52, 13.405);

        let first = repo.create(&input).unwrap();
        assert!(matches!(
            repo.create(&input).unwrap_err(),
            StoreError::UniquenessViolation { entity: "Location", .. }
        ));

        repo.delete(first.id).unwrap();
        let second = repo.create(&input).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_location_coordinates_are_checked() {
        let repo = LocationRepository::new(pool());
        assert!(matches!(
            repo.create(&CreateLocation::new("Nowhere", 91.0, 0.0)),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            repo.create(&CreateLocation {
                name: Some("Nowhere".into()),
                latitude: Some(1.0),
                longitude: None,
            }),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_is_idempotent_and_unknown_id_is_not_found() {
        let repo = LocationRepository::new(pool());
        let location = repo.create(&CreateLocation::new("Club", 1.0, 2.0)).unwrap();

        repo.delete(location.id).unwrap();
        repo.delete(location.id).unwrap();
        let stored = repo.find_by_id_including_inactive(location.id).unwrap().unwrap();
        assert!(!stored.is_active);

        assert!(matches!(repo.delete(9999), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_bulk_delete_hides_every_member() {
        let repo = SongRepository::new(pool());
        let a = repo.create(&CreateSong::new("A", "One", "https://open.spotify.com/track/a")).unwrap();
        let b = repo.create(&CreateSong::new("B", "Two", "https://open.spotify.com/track/b")).unwrap();
        let c = repo.create(&CreateSong::new("C", "Three", "https://open.spotify.com/track/c")).unwrap();

        repo.delete(a.id).unwrap();
        let matched = repo.bulk_delete(&[a.id, b.id, 4242]).unwrap();
        assert_eq!(matched, 2);

        let visible: Vec<i32> = repo.find_all().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(visible, vec![c.id]);
        assert_eq!(repo.find_all_including_inactive().unwrap().len(), 3);
        assert_eq!(repo.bulk_delete(&[]).unwrap(), 0);
    }

    #[test]
    fn test_bulk_delete_beyond_sqlite_parameter_limit() {
        let repo = LocationRepository::new(pool());
        let kept = repo.create(&CreateLocation::new("Kept", 1.0, 1.0)).unwrap();
        let gone = repo.create(&CreateLocation::new("Gone", 2.0, 2.0)).unwrap();

        let mut ids: Vec<i32> = (100_000..140_000).collect();
        ids.push(gone.id);
        assert_eq!(repo.bulk_delete(&ids).unwrap(), 1);

        let visible: Vec<i32> = repo.find_all().unwrap().iter().map(|l| l.id).collect();
        assert_eq!(visible, vec![kept.id]);
    }

    #[test]
    fn test_song_spotify_url_unique_even_after_delete() {
        let repo = SongRepository::new(pool());
        let input = CreateSong::new("Artist", "Track", "https://open.spotify.com/track/x");
        let song = repo.create(&input).unwrap();
        assert_eq!(song.image_url, "");

        repo.delete(song.id).unwrap();
        assert!(matches!(
            repo.create(&input).unwrap_err(),
            StoreError::UniquenessViolation { entity: "Song", field: "spotify_url" }
        ));
    }

    #[test]
    fn test_event_for_non_dj_is_rejected_and_not_stored() {
        let pool = pool();
        let events = EventRepository::new(pool.clone());
        let location = LocationRepository::new(pool.clone())
            .create(&CreateLocation::new("Club", 1.0, 2.0))
            .unwrap();
        let fan = user(&pool, "fan@example.com");

        let err = events
            .create(&CreateEvent::new("Night", fan.id, location.id))
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: user must be a DJ");
        assert!(events.find_all_including_inactive().unwrap().is_empty());
    }

    #[test]
    fn test_event_defaults_and_location_exclusivity() {
        let pool = pool();
        let events = EventRepository::new(pool.clone());
        let locations = LocationRepository::new(pool.clone());
        let spinner = dj(&pool, "dj@example.com", "DJ Spinner");
        let club = locations.create(&CreateLocation::new("Club", 1.0, 2.0)).unwrap();

        let event = events.create(&CreateEvent::new("Night", spinner.id, club.id)).unwrap();
        assert_eq!(Some(event.end_at), default_end(event.start_at));
        assert!(event.is_live());

        assert!(matches!(
            events.create(&CreateEvent::new("Second", spinner.id, club.id)),
            Err(StoreError::UniquenessViolation { entity: "Event", .. })
        ));

        events.delete(event.id).unwrap();
        events.create(&CreateEvent::new("Second", spinner.id, club.id)).unwrap();
    }

    #[test]
    fn test_event_start_at_end_of_time_is_rejected() {
        let pool = pool();
        let events = EventRepository::new(pool.clone());
        let spinner = dj(&pool, "dj@example.com", "DJ Spinner");
        let club = LocationRepository::new(pool.clone())
            .create(&CreateLocation::new("Club", 1.0, 2.0))
            .unwrap();

        let input = CreateEvent {
            start: Some(chrono::DateTime::<Utc>::MAX_UTC),
            ..CreateEvent::new("Forever", spinner.id, club.id)
        };
        let err = events.create(&input).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Event start is out of range");
        assert!(events.find_all_including_inactive().unwrap().is_empty());
    }

    #[test]
    fn test_event_update_rechecks_dj() {
        let pool = pool();
        let events = EventRepository::new(pool.clone());
        let profiles = DjProfileRepository::new(pool.clone());
        let spinner = dj(&pool, "dj@example.com", "DJ Spinner");
        let fan = user(&pool, "fan@example.com");
        let club = LocationRepository::new(pool.clone())
            .create(&CreateLocation::new("Club", 1.0, 2.0))
            .unwrap();
        let event = events.create(&CreateEvent::new("Night", spinner.id, club.id)).unwrap();

        let reassign = UpdateEvent {
            dj_id: Some(fan.id),
            ..Default::default()
        };
        assert!(matches!(events.update(event.id, &reassign), Err(StoreError::Validation(_))));
        assert_eq!(events.find_by_id(event.id).unwrap().unwrap().dj_id, spinner.id);

        let rename = UpdateEvent {
            name: Some("Late Night".into()),
            ..Default::default()
        };
        assert_eq!(events.update(event.id, &rename).unwrap().name, "Late Night");

        let profile = profiles.find_for_user(spinner.id).unwrap().unwrap();
        profiles.delete(profile.id).unwrap();
        assert!(matches!(events.update(event.id, &rename), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_song_request_takes_dj_from_event() {
        let pool = pool();
        let spinner = dj(&pool, "dj@example.com", "DJ Spinner");
        let fan = user(&pool, "fan@example.com");
        let club = LocationRepository::new(pool.clone())
            .create(&CreateLocation::new("Club", 1.0, 2.0))
            .unwrap();
        let event = EventRepository::new(pool.clone())
            .create(&CreateEvent::new("Night", spinner.id, club.id))
            .unwrap();
        let song = SongRepository::new(pool.clone())
            .create(&CreateSong::new("Artist", "Track", "https://open.spotify.com/track/x"))
            .unwrap();

        let requests = SongRequestRepository::new(pool.clone());
        let request = requests
            .create(fan.id, &CreateSongRequest::new(song.id, event.id))
            .unwrap();

        assert_eq!(request.status, RequestStatus::Requested);
        assert_eq!(request.dj_id, spinner.id);
        assert_eq!(request.user_id, fan.id);
        assert_eq!(requests.find_by_event(event.id).unwrap().len(), 1);

        requests.delete(request.id).unwrap();
        assert!(requests.find_by_event(event.id).unwrap().is_empty());
        assert!(requests.find_by_id_including_inactive(request.id).unwrap().is_some());
    }

    #[test]
    fn test_song_request_requires_active_song() {
        let pool = pool();
        let spinner = dj(&pool, "dj@example.com", "DJ Spinner");
        let club = LocationRepository::new(pool.clone())
            .create(&CreateLocation::new("Club", 1.0, 2.0))
            .unwrap();
        let event = EventRepository::new(pool.clone())
            .create(&CreateEvent::new("Night", spinner.id, club.id))
            .unwrap();
        let songs = SongRepository::new(pool.clone());
        let song = songs
            .create(&CreateSong::new("Artist", "Track", "https://open.spotify.com/track/x"))
            .unwrap();
        songs.delete(song.id).unwrap();

        let err = SongRequestRepository::new(pool)
            .create(spinner.id, &CreateSongRequest::new(song.id, event.id))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
