//! JSON response envelope.
//!
//! Success: `{"status": "ok", "serverVersion": "...", <key>: <payload>}`.
//! Failure: `{"status": "failed", "serverVersion": "...", "error": {"code": ..., "message": ...}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::error::ApiError;

/// Server version from Cargo.toml.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response status values.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Failed,
}

fn envelope(status: ResponseStatus) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("status".into(), json!(status));
    body.insert("serverVersion".into(), json!(SERVER_VERSION));
    body
}

/// A successful response under construction.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Result<Map<String, Value>, serde_json::Error>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            body: Ok(envelope(ResponseStatus::Ok)),
        }
    }

    pub fn created() -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok()
        }
    }

    /// Attach a payload under `key`.
    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.body = self.body.and_then(|mut body| {
            body.insert(key.to_string(), serde_json::to_value(value)?);
            Ok(body)
        });
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.body {
            Ok(body) => (self.status, Json(Value::Object(body))).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize JSON response: {}", e);
                error_response(&ApiError::Internal)
            }
        }
    }
}

/// Helper to create an empty successful response.
pub fn ok_empty() -> ApiResponse {
    ApiResponse::ok()
}

/// Helper to create a successful response with a single payload.
pub fn ok_with<T: Serialize>(key: &str, value: T) -> ApiResponse {
    ApiResponse::ok().with(key, value)
}

/// Helper to create a `201 Created` response with a single payload.
pub fn created_with<T: Serialize>(key: &str, value: T) -> ApiResponse {
    ApiResponse::created().with(key, value)
}

/// Build the failure envelope for an error.
pub fn error_response(error: &ApiError) -> Response {
    let mut body = envelope(ResponseStatus::Failed);
    body.insert(
        "error".into(),
        json!({
            "code": error.code().as_str(),
            "message": error.message(),
        }),
    );
    (error.status(), Json(Value::Object(body))).into_response()
}
