//! Avatars from a local directory.

use async_trait::async_trait;
use pixel_rankcard::{Avatar, AvatarService, Identity};
use std::path::{Path, PathBuf};

/// Serves `{dir}/{user_id}.png`, or the identity's `avatar_url` when it is a
/// `file://` URL or plain path (relative paths resolve against `dir`).
#[derive(Debug, Clone)]
pub struct FileAvatarService {
    dir: PathBuf,
}

impl FileAvatarService {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, identity: &Identity) -> PathBuf {
        let local = identity
            .avatar_url
            .as_deref()
            .and_then(|url| match url.strip_prefix("file://") {
                Some(path) => Some(path),
                None if !url.contains("://") => Some(url),
                None => None,
            });
        match local {
            Some(path) => self.dir.join(path),
            None => self.dir.join(format!("{}.png", identity.user_id)),
        }
    }
}

#[async_trait]
impl AvatarService for FileAvatarService {
    async fn fetch_avatar(&self, identity: &Identity) -> pixel_rankcard::Result<Avatar> {
        let path = self.path_for(identity);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            tracing::debug!("No avatar at {:?}: {}", path, e);
            pixel_rankcard::Error::Avatar(format!("{}: {}", path.display(), e))
        })?;

        Ok(Avatar {
            source: path.display().to_string(),
            bytes,
        })
    }
}
