//! Database connection pool and management.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;
use thiserror::Error;

/// Type alias for our connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Connection timeout in seconds.
    pub connection_timeout: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: "bethedj.db".to_string(),
            max_connections: 10,
            connection_timeout: 30,
        }
    }
}

impl DbConfig {
    /// Create a new database configuration.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    /// Configuration for a private in-memory database.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection that lives as long as the pool.
    pub fn in_memory() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            max_connections: 1,
            connection_timeout: 5,
        }
    }

    /// Build a connection pool from this configuration.
    pub fn build_pool(&self) -> Result<DbPool, PoolError> {
        let manager = ConnectionManager::<SqliteConnection>::new(&self.database_url);

        let mut builder = Pool::<ConnectionManager<SqliteConnection>>::builder()
            .max_size(self.max_connections)
            .connection_timeout(Duration::from_secs(self.connection_timeout));

        // Recycling the only connection of an in-memory pool would drop the database.
        if self.database_url == ":memory:" {
            builder = builder.max_lifetime(None).idle_timeout(None);
        }

        builder.build(manager)
    }
}

/// Errors raised while opening and migrating the database.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Migration failed: {0}")]
    Migration(#[from] diesel::result::Error),
}

/// Build the pool and bring the schema up to date.
pub fn setup_database(config: &DbConfig) -> Result<DbPool, SetupError> {
    let pool = config.build_pool()?;
    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;
    drop(conn);
    Ok(pool)
}

/// Run the SQL migrations to set up the database schema.
///
/// Uniqueness that must only hold among live rows is expressed with partial
/// indexes filtered on `is_active`.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            is_staff BOOLEAN NOT NULL DEFAULT FALSE,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            api_token TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(conn)?;

    diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(conn)?;

    diesel::sql_query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_api_token ON users(api_token) WHERE api_token IS NOT NULL",
    )
    .execute(conn)?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS dj_profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            user_id INTEGER REFERENCES users(id),
            name TEXT NOT NULL UNIQUE,
            image TEXT,
            image_name TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(conn)?;

    diesel::sql_query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_dj_profiles_active_user ON dj_profiles(user_id) WHERE is_active AND user_id IS NOT NULL",
    )
    .execute(conn)?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            name TEXT NOT NULL,
            latitude DOUBLE NOT NULL,
            longitude DOUBLE NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(conn)?;

    diesel::sql_query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_locations_active_place ON locations(name, latitude, longitude) WHERE is_active",
    )
    .execute(conn)?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            name TEXT NOT NULL,
            dj_id INTEGER NOT NULL REFERENCES users(id),
            location_id INTEGER NOT NULL REFERENCES locations(id),
            start_at TIMESTAMP NOT NULL,
            end_at TIMESTAMP NOT NULL,
            image TEXT,
            image_name TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(conn)?;

    diesel::sql_query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_events_active_location ON events(location_id) WHERE is_active",
    )
    .execute(conn)?;

    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_events_time ON events(start_at, end_at)",
    )
    .execute(conn)?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            artist TEXT NOT NULL,
            name TEXT NOT NULL,
            spotify_url TEXT NOT NULL UNIQUE,
            image_url TEXT NOT NULL DEFAULT '',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(conn)?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS song_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            song_id INTEGER NOT NULL REFERENCES songs(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            dj_id INTEGER NOT NULL REFERENCES users(id),
            event_id INTEGER NOT NULL REFERENCES events(id),
            status TEXT NOT NULL DEFAULT 'REQUESTED',
            last_status_timestamp TIMESTAMP NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(conn)?;

    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_song_requests_status_time ON song_requests(status, last_status_timestamp)",
    )
    .execute(conn)?;

    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_song_requests_event ON song_requests(event_id)",
    )
    .execute(conn)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.database_url, "bethedj.db");
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let pool = setup_database(&DbConfig::in_memory()).unwrap();
        let mut conn = pool.get().unwrap();
        run_migrations(&mut conn).unwrap();
    }
}
