//! HTTP API module.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;

pub use auth::AuthUser;
pub use error::{ApiError, ErrorCode};
pub use response::{ApiResponse, ok_empty, ok_with};
pub use router::{AppState, TransitionRouterExt, create_router};
