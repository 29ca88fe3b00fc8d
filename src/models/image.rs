//! Images embedded directly in a row as base64 text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when an embedded image cannot be decoded.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image content is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image content is empty")]
    Empty,
}

/// Base64 image content plus the filename it was uploaded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub content: String,
    pub name: String,
}

impl ImagePayload {
    /// Encode raw image bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            content: STANDARD.encode(bytes),
            name: name.into(),
        }
    }

    /// Decode back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ImageError> {
        let bytes = STANDARD.decode(self.content.trim())?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(bytes)
    }

    /// Rebuild from the nullable `image`/`image_name` column pair.
    pub fn from_columns(content: Option<String>, name: Option<String>) -> Option<Self> {
        content.map(|content| Self {
            content,
            name: name.unwrap_or_default(),
        })
    }
}
