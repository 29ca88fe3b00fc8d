//! Integration tests driving the HTTP router end to end.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app};
use serde_json::json;

// ---------------------------------------------------------------------------
// Health and authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok_envelope() {
    let app = build_test_app();
    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["serverVersion"].is_string());
    assert_eq!(json["liveEvents"], 0);
}

#[tokio::test]
async fn register_login_me_logout() {
    let app = build_test_app();

    let response = app
        .post_json(
            "/api/users",
            None,
            json!({"email": "fan@example.com", "name": "Fan", "password": "pw", "is_staff": true}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["user"]["is_staff"], false);
    assert_eq!(json["user"]["is_dj"], false);

    let response = app
        .post_json(
            "/api/login",
            None,
            json!({"email": "fan@example.com", "password": "pw"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 40);

    let response = app.get("/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["email"], "fan@example.com");

    let response = app.post_json("/api/logout", Some(&token), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_and_missing_token_are_rejected() {
    let app = build_test_app();
    app.login_as("fan@example.com", false).await;

    let response = app
        .post_json(
            "/api/login",
            None,
            json!({"email": "fan@example.com", "password": "nope"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "failed");
    assert_eq!(json["error"]["code"], "wrong_credentials");

    let response = app.get("/api/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "not_authenticated");
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = build_test_app();
    let body = json!({"email": "fan@example.com", "name": "Fan", "password": "pw"});

    let first = app.post_json("/api/users", None, body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.post_json("/api/users", None, body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["error"]["code"], "uniqueness_violation");
}

#[tokio::test]
async fn closed_account_can_no_longer_log_in() {
    let app = build_test_app();
    let (id, token) = app.login_as("fan@example.com", false).await;

    let response = app.delete("/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_json(
            "/api/login",
            None,
            json!({"email": "fan@example.com", "password": "correct horse"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let stored = app.store.users.find_by_id_including_inactive(id).unwrap().unwrap();
    assert!(!stored.is_active);
}

// ---------------------------------------------------------------------------
// DJ profiles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn staff_profile_follows_the_given_user_id() {
    let app = build_test_app();
    let (_, staff_token) = app.login_as("staff@example.com", true).await;
    let (fan_id, fan_token) = app.login_as("fan@example.com", false).await;

    let response = app
        .post_json("/api/dj-profiles", Some(&staff_token), json!({"name": "House Crew"}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(body_json(response).await["djProfile"].get("user_id").is_none());

    let response = app
        .post_json(
            "/api/dj-profiles",
            Some(&staff_token),
            json!({"name": "Resident", "user_id": null}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(body_json(response).await["djProfile"].get("user_id").is_none());

    let response = app.get("/api/me", Some(&staff_token)).await;
    assert_eq!(body_json(response).await["user"]["is_dj"], false);

    let response = app
        .post_json(
            "/api/dj-profiles",
            Some(&staff_token),
            json!({"name": "Fan Beats", "user_id": fan_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["djProfile"]["user_id"], fan_id);

    let response = app.get("/api/me", Some(&fan_token)).await;
    assert_eq!(body_json(response).await["user"]["is_dj"], true);
}

#[tokio::test]
async fn non_staff_cannot_make_someone_else_a_dj() {
    let app = build_test_app();
    let (staff_id, _) = app.login_as("staff@example.com", true).await;
    let (_, fan_token) = app.login_as("fan@example.com", false).await;

    let response = app
        .post_json(
            "/api/dj-profiles",
            Some(&fan_token),
            json!({"name": "Impostor", "user_id": staff_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_dj_cannot_create_event() {
    let app = build_test_app();
    let (_, token) = app.login_as("fan@example.com", false).await;

    let response = app
        .post_json(
            "/api/locations",
            Some(&token),
            json!({"name": "Club", "latitude": 1.0, "longitude": 2.0}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location_id = body_json(response).await["location"]["id"].as_i64().unwrap();

    let response = app
        .post_json(
            "/api/events",
            Some(&token),
            json!({"name": "Night", "location_id": location_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["error"]["message"], "user must be a DJ");

    assert!(app.store.events.find_all_including_inactive().unwrap().is_empty());
}

#[tokio::test]
async fn dj_creates_and_edits_event_others_cannot() {
    let app = build_test_app();
    let (dj_id, dj_token) = app.dj("dj@example.com", "DJ Booth").await;
    let (_, fan_token) = app.login_as("fan@example.com", false).await;

    let response = app
        .post_json(
            "/api/locations",
            Some(&dj_token),
            json!({"name": "Club", "latitude": 1.0, "longitude": 2.0}),
        )
        .await;
    let location_id = body_json(response).await["location"]["id"].as_i64().unwrap();

    let response = app
        .post_json(
            "/api/events",
            Some(&dj_token),
            json!({"name": "Night", "location_id": location_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let event = body_json(response).await["event"].clone();
    assert_eq!(event["dj_id"], dj_id);
    assert_eq!(event["is_live"], true);
    let event_id = event["id"].as_i64().unwrap();

    let uri = format!("/api/events/{}", event_id);
    let response = app
        .patch_json(&uri, Some(&fan_token), json!({"name": "Hijacked"}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .patch_json(&uri, Some(&dj_token), json!({"name": "Late Night"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["event"]["name"], "Late Night");

    let response = app.get("/api/events?live=true", None).await;
    assert_eq!(body_json(response).await["events"].as_array().unwrap().len(), 1);

    let response = app.delete(&uri, Some(&dj_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.get(&uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_starting_at_end_of_time_is_a_validation_error() {
    let app = build_test_app();
    let (_, dj_token) = app.dj("dj@example.com", "DJ Booth").await;

    let response = app
        .post_json(
            "/api/locations",
            Some(&dj_token),
            json!({"name": "Club", "latitude": 1.0, "longitude": 2.0}),
        )
        .await;
    let location_id = body_json(response).await["location"]["id"].as_i64().unwrap();

    let response = app
        .post_json(
            "/api/events",
            Some(&dj_token),
            json!({"name": "Forever", "location_id": location_id, "start": "+262142-12-31T23:00:00Z"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["message"], "Event start is out of range");
}

#[tokio::test]
async fn duplicate_active_location_conflicts_until_deleted() {
    let app = build_test_app();
    let (_, staff_token) = app.login_as("staff@example.com", true).await;
    let body = json!({"name": "Warehouse", "latitude": 52.5, "longitude": 13.4});

    let response = app.post_json("/api/locations", Some(&staff_token), body.clone()).await;
    let first_id = body_json(response).await["location"]["id"].as_i64().unwrap();

    let response = app.post_json("/api/locations", Some(&staff_token), body.clone()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .delete(&format!("/api/locations/{}", first_id), Some(&staff_token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.post_json("/api/locations", Some(&staff_token), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Song requests
// ---------------------------------------------------------------------------

/// DJ with a live event, a fan, and a song. Returns (dj token, fan token, event id, song id).
async fn party(app: &common::TestApp) -> (String, String, i64, i64) {
    let (_, dj_token) = app.dj("dj@example.com", "DJ Booth").await;
    let (_, fan_token) = app.login_as("fan@example.com", false).await;

    let response = app
        .post_json(
            "/api/locations",
            Some(&dj_token),
            json!({"name": "Club", "latitude": 1.0, "longitude": 2.0}),
        )
        .await;
    let location_id = body_json(response).await["location"]["id"].as_i64().unwrap();

    let response = app
        .post_json(
            "/api/events",
            Some(&dj_token),
            json!({"name": "Night", "location_id": location_id}),
        )
        .await;
    let event_id = body_json(response).await["event"]["id"].as_i64().unwrap();

    let response = app
        .post_json(
            "/api/songs",
            Some(&fan_token),
            json!({
                "artist": "Daft Punk",
                "name": "One More Time",
                "spotify_url": "https://open.spotify.com/track/0DiWol3AO6WpXZgp0goxAV"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let song_id = body_json(response).await["song"]["id"].as_i64().unwrap();

    (dj_token, fan_token, event_id, song_id)
}

#[tokio::test]
async fn request_workflow_start_then_reject_fails() {
    let app = build_test_app();
    let (dj_token, fan_token, event_id, song_id) = party(&app).await;

    let response = app
        .post_json(
            "/api/song-requests",
            Some(&fan_token),
            json!({"song_id": song_id, "event_id": event_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let request = body_json(response).await["songRequest"].clone();
    assert_eq!(request["status"], "REQUESTED");
    let id = request["id"].as_i64().unwrap();

    let response = app
        .post_json(&format!("/api/song-requests/{}/start", id), Some(&fan_token), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_json(&format!("/api/song-requests/{}/start", id), Some(&dj_token), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["songRequest"]["status"], "PENDING");

    let response = app
        .post_json(&format!("/api/song-requests/{}/reject", id), Some(&dj_token), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "invalid_transition");

    let response = app
        .get(&format!("/api/events/{}/requests?status=PENDING", event_id), None)
        .await;
    let listed = body_json(response).await["songRequests"].clone();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["status"], "PENDING");

    let response = app
        .post_json(
            &format!("/api/song-requests/{}/status", id),
            Some(&dj_token),
            json!({"status": "played"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["songRequest"]["status"], "PLAYED");
}

#[tokio::test]
async fn unknown_status_is_a_validation_error() {
    let app = build_test_app();
    let (dj_token, fan_token, event_id, song_id) = party(&app).await;
    let response = app
        .post_json(
            "/api/song-requests",
            Some(&fan_token),
            json!({"song_id": song_id, "event_id": event_id}),
        )
        .await;
    let id = body_json(response).await["songRequest"]["id"].as_i64().unwrap();

    let response = app
        .post_json(
            &format!("/api/song-requests/{}/status", id),
            Some(&dj_token),
            json!({"status": "SKIPPED"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn withdrawn_request_disappears_from_listing() {
    let app = build_test_app();
    let (_, fan_token, event_id, song_id) = party(&app).await;
    let response = app
        .post_json(
            "/api/song-requests",
            Some(&fan_token),
            json!({"song_id": song_id, "event_id": event_id}),
        )
        .await;
    let id = body_json(response).await["songRequest"]["id"].as_i64().unwrap();

    let uri = format!("/api/song-requests/{}", id);
    assert_eq!(app.delete(&uri, Some(&fan_token)).await.status(), StatusCode::OK);
    assert_eq!(app.delete(&uri, Some(&fan_token)).await.status(), StatusCode::OK);

    let response = app
        .get(&format!("/api/events/{}/requests", event_id), None)
        .await;
    assert!(body_json(response).await["songRequests"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_bulk_delete_and_inactive_listing() {
    let app = build_test_app();
    let (_, staff_token) = app.login_as("staff@example.com", true).await;
    let (_, fan_token) = app.login_as("fan@example.com", false).await;

    let mut ids = Vec::new();
    for (i, name) in ["One", "Two", "Three"].iter().enumerate() {
        let response = app
            .post_json(
                "/api/songs",
                Some(&fan_token),
                json!({"artist": "A", "name": name, "spotify_url": format!("https://open.spotify.com/track/{}", i)}),
            )
            .await;
        ids.push(body_json(response).await["song"]["id"].as_i64().unwrap());
    }

    let response = app
        .post_json(
            "/api/admin/songs/bulk-delete",
            Some(&fan_token),
            json!({"ids": [ids[0]]}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_json(
            "/api/admin/songs/bulk-delete",
            Some(&staff_token),
            json!({"ids": [ids[0], ids[1]]}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["deleted"], 2);

    let response = app.get("/api/songs", None).await;
    let songs = body_json(response).await["songs"].clone();
    assert_eq!(songs.as_array().unwrap().len(), 1);
    assert_eq!(songs[0]["id"], ids[2]);

    let response = app.get("/api/admin/songs", Some(&staff_token)).await;
    let items = body_json(response).await["items"].clone();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items.iter().filter(|i| i["is_active"] == false).count(), 2);

    let response = app.get("/api/admin/playlists", Some(&staff_token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
