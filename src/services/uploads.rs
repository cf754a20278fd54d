//! Keeps stored media files in step with the records that reference them

use std::sync::Arc;

use crate::{
    error::AppResult,
    media::{entity_dir, media_path, renamed_path, MediaCategory, MediaStorage},
    models::Upload,
};

#[derive(Clone)]
pub struct MediaFiles {
    storage: Arc<dyn MediaStorage>,
}

impl MediaFiles {
    pub fn new(storage: Arc<dyn MediaStorage>) -> Self {
        Self { storage }
    }

    /// Write an upload for entity `id` and return its path. A previous file at another
    /// path is removed afterwards.
    pub async fn store(
        &self,
        category: MediaCategory,
        id: i32,
        slug: &str,
        upload: &Upload,
        previous: Option<&str>,
    ) -> AppResult<String> {
        let path = media_path(category, id, slug, &upload.file_name);
        self.storage.save(&path, &upload.bytes).await?;

        if let Some(previous) = previous.filter(|p| *p != path) {
            if let Err(e) = self.storage.remove(previous).await {
                tracing::warn!(path = %previous, "Failed to remove replaced media file: {}", e);
            }
        }
        Ok(path)
    }

    /// Move a stored file so its name follows `slug`. Returns the new path, or `None`
    /// when nothing moved; a failed move is logged and the old path kept.
    pub async fn follow_slug(&self, current: Option<&str>, slug: &str) -> Option<String> {
        let current = current?;
        let target = renamed_path(current, slug);
        if target == current {
            return None;
        }
        match self.storage.rename(current, &target).await {
            Ok(()) => {
                tracing::debug!(from = %current, to = %target, "Renamed media file");
                Some(target)
            }
            Err(e) => {
                tracing::warn!(path = %current, "Failed to rename media file: {}", e);
                None
            }
        }
    }

    /// Drop every file of a deleted entity
    pub async fn purge(&self, category: MediaCategory, id: i32) {
        let dir = entity_dir(category, id);
        if let Err(e) = self.storage.remove_dir(&dir).await {
            tracing::warn!(path = %dir, "Failed to remove media directory: {}", e);
        }
    }
}
