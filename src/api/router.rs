//! Route table.
//!
//! Every operation is registered explicitly here. The per-entity admin
//! routes dispatch on [`EntityKind`](crate::models::EntityKind) route names.

use axum::{
    Router,
    extract::FromRef,
    handler::Handler,
    routing::{MethodRouter, delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::db::{DbPool, Store};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        Self {
            store: Store::new(pool),
        }
    }
}

impl FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

/// Extension trait for registering status-transition endpoints.
pub trait TransitionRouterExt<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Register `POST /api/song-requests/{id}/<action>`.
    fn transition_route<H, T>(self, action: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static;
}

impl<S> TransitionRouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn transition_route<H, T>(self, action: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let path = format!("/api/song-requests/{{id}}/{}", action);
        let route: MethodRouter<S> = post(handler);
        self.route(&path, route)
    }
}

/// Create the main router with every API route.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Accounts
        .route("/api/users", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/me", get(handlers::me).delete(handlers::close_account))
        // DJ profiles
        .route(
            "/api/dj-profiles",
            get(handlers::list_dj_profiles).post(handlers::create_dj_profile),
        )
        .route(
            "/api/dj-profiles/{id}",
            delete(handlers::delete_dj_profile),
        )
        // Locations
        .route(
            "/api/locations",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route(
            "/api/locations/{id}",
            delete(handlers::delete_location),
        )
        // Events
        .route(
            "/api/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route(
            "/api/events/{id}",
            get(handlers::get_event)
                .patch(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route("/api/events/{id}/requests", get(handlers::list_event_requests))
        // Songs
        .route(
            "/api/songs",
            get(handlers::list_songs).post(handlers::create_song),
        )
        .route("/api/songs/{id}", delete(handlers::delete_song))
        // Song requests
        .route("/api/song-requests", post(handlers::create_song_request))
        .route(
            "/api/song-requests/{id}",
            delete(handlers::delete_song_request),
        )
        .transition_route("status", handlers::change_status)
        .transition_route("reject", handlers::reject_request)
        .transition_route("start", handlers::start_request)
        .transition_route("expire", handlers::expire_request)
        .transition_route("play", handlers::play_request)
        // Admin
        .route("/api/admin/{entity}", get(handlers::list_entities))
        .route("/api/admin/{entity}/bulk-delete", post(handlers::bulk_delete))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
