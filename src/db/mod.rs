//! Database module for SQLite persistence.

pub mod connection;
pub mod repository;
pub mod schema;
pub mod soft_delete;
pub mod store;

pub use connection::{DbConfig, DbPool, SetupError, run_migrations, setup_database};
pub use repository::{
    DjProfileRepository, EventRepository, LocationRepository, SongRepository,
    SongRequestRepository, UserRepository,
};
pub use soft_delete::{SoftDelete, Visibility};
pub use store::Store;
