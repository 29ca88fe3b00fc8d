//! DJ profiles. A user is a DJ exactly when an active profile points at them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::image::ImagePayload;

#[derive(Debug, Clone)]
pub struct DjProfile {
    pub id: i32,
    /// A profile can exist detached from any account.
    pub user_id: Option<i32>,
    pub name: String,
    pub image: Option<ImagePayload>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateDjProfile {
    pub user_id: Option<i32>,
    pub name: Option<String>,
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Serialize, Clone)]
pub struct DjProfileResponse {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

impl From<&DjProfile> for DjProfileResponse {
    fn from(profile: &DjProfile) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            name: profile.name.clone(),
            image: profile.image.clone(),
        }
    }
}
