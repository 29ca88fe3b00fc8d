//! User model and related types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::crypto::password::verify_password;

/// A user in the system (domain model).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    /// Argon2 hashed password.
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    /// Token issued at login, cleared at logout.
    pub api_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Verify password using Argon2.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).unwrap_or(false)
    }
}

/// Registration input. Every field is optional at the wire level so a missing
/// one can be reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    /// Defaults to `false`.
    pub is_staff: Option<bool>,
}

impl CreateUser {
    pub fn new(email: &str, name: &str, password: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            name: Some(name.to_string()),
            password: Some(password.to_string()),
            is_staff: None,
        }
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = Some(true);
        self
    }
}

/// Lower-case the domain part of an email address, leaving the local part alone.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// API user response format. `is_dj` is resolved from the profile lookup.
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_dj: bool,
    pub is_staff: bool,
    pub is_active: bool,
}

impl UserResponse {
    pub fn new(user: &User, is_dj: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_dj,
            is_staff: user.is_staff,
            is_active: user.is_active,
        }
    }
}
