//! HTTP handlers, one module per resource.

pub mod accounts;
pub mod admin;
pub mod dj_profiles;
pub mod events;
pub mod locations;
pub mod song_requests;
pub mod songs;
pub mod system;

pub use accounts::*;
pub use admin::*;
pub use dj_profiles::*;
pub use events::*;
pub use locations::*;
pub use song_requests::*;
pub use songs::*;
pub use system::*;
