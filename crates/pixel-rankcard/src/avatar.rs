//! Identities and the avatar service.

use crate::error::Result;
use async_trait::async_trait;
use pixel_levels::UserId;
use serde::{Deserialize, Serialize};

/// Who the card is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    /// Where the avatar lives, if the platform supplied one.
    pub avatar_url: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Encoded avatar image. Decoding is left to whoever rasterizes the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    /// Where the bytes came from.
    pub source: String,
    pub bytes: Vec<u8>,
}

/// Fetches avatar images.
#[async_trait]
pub trait AvatarService: Send + Sync {
    async fn fetch_avatar(&self, identity: &Identity) -> Result<Avatar>;
}
