//! Shared helpers for HTTP integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use bethedj::api::{AppState, create_router};
use bethedj::db::{DbConfig, Store, setup_database};
use bethedj::models::CreateUser;

/// A router over a fresh in-memory database, plus direct store access for setup.
pub struct TestApp {
    pub router: Router,
    pub store: Store,
}

pub fn build_test_app() -> TestApp {
    let pool = setup_database(&DbConfig::in_memory()).unwrap();
    let state = AppState::new(pool);
    TestApp {
        store: state.store.clone(),
        router: create_router(state),
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Token {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Create a user directly in the store and log in over HTTP.
    pub async fn login_as(&self, email: &str, staff: bool) -> (i32, String) {
        let mut input = CreateUser::new(email, "Tester", "correct horse");
        if staff {
            input = input.staff();
        }
        let user = self.store.users.create(&input).unwrap();

        let response = self
            .post_json(
                "/api/login",
                None,
                json!({"email": email, "password": "correct horse"}),
            )
            .await;
        let json = body_json(response).await;
        (user.id, json["token"].as_str().unwrap().to_string())
    }

    /// Log in a user who also holds a DJ profile.
    pub async fn dj(&self, email: &str, name: &str) -> (i32, String) {
        let (id, token) = self.login_as(email, false).await;
        let response = self
            .post_json("/api/dj-profiles", Some(&token), json!({"name": name}))
            .await;
        assert_eq!(response.status(), 201);
        (id, token)
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
