//! Storage paths and filesystem writer for uploaded images and book files.
//!
//! Every stored file lives at `{category}/{id}/{slug}.{ext}` relative to the media root.
//! Keying the directory by the immutable id means a rename only changes the file stem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

/// Top-level media directory per entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Authors,
    Books,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Authors => "authors",
            MediaCategory::Books => "books",
        }
    }
}

/// Lowercased extension of an uploaded file name, if it has a usable one
pub fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Relative path for a file owned by entity `id`, named after `slug`
pub fn media_path(category: MediaCategory, id: i32, slug: &str, original_name: &str) -> String {
    match extension(original_name) {
        Some(ext) => format!("{}/{}/{}.{}", category.as_str(), id, slug, ext),
        None => format!("{}/{}/{}", category.as_str(), id, slug),
    }
}

/// Path of an already stored file after its owner's slug changed; the extension is kept
pub fn renamed_path(current: &str, slug: &str) -> String {
    let (dir, file) = current.rsplit_once('/').unwrap_or(("", current));
    let renamed = match extension(file) {
        Some(ext) => format!("{}.{}", slug, ext),
        None => slug.to_string(),
    };
    if dir.is_empty() {
        renamed
    } else {
        format!("{}/{}", dir, renamed)
    }
}

/// Directory holding every file of one entity
pub fn entity_dir(category: MediaCategory, id: i32) -> String {
    format!("{}/{}", category.as_str(), id)
}

/// Write side of media storage; paths are relative to the storage root
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` at `path`, replacing any file already there
    async fn save(&self, path: &str, bytes: &[u8]) -> std::io::Result<()>;

    async fn rename(&self, from: &str, to: &str) -> std::io::Result<()>;

    /// Remove one file; a missing file is not an error
    async fn remove(&self, path: &str) -> std::io::Result<()>;

    /// Remove a directory and everything below it; a missing directory is not an error
    async fn remove_dir(&self, path: &str) -> std::io::Result<()>;
}

/// Local filesystem storage under a root directory
#[derive(Debug, Clone)]
pub struct FsMediaStorage {
    root: PathBuf,
}

impl FsMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> std::io::Result<PathBuf> {
        let relative = Path::new(relative);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid media path: {}", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }
}

fn ignore_missing(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[async_trait]
impl MediaStorage for FsMediaStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> std::io::Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write next to the target first, then move into place
        let tmp = target.with_file_name(format!(".{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        tracing::debug!(path = %path, size = bytes.len(), "Stored media file");
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> std::io::Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(source, target).await
    }

    async fn remove(&self, path: &str) -> std::io::Result<()> {
        ignore_missing(fs::remove_file(self.resolve(path)?).await)
    }

    async fn remove_dir(&self, path: &str) -> std::io::Result<()> {
        ignore_missing(fs::remove_dir_all(self.resolve(path)?).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_category_id_and_slug() {
        assert_eq!(
            media_path(MediaCategory::Books, 12, "voina-i-mir", "Cover.JPG"),
            "books/12/voina-i-mir.jpg"
        );
        assert_eq!(
            media_path(MediaCategory::Authors, 3, "lev-tolstoi", "portrait.tar.gz"),
            "authors/3/lev-tolstoi.gz"
        );
    }

    #[test]
    fn unusable_extension_is_omitted() {
        assert_eq!(media_path(MediaCategory::Books, 1, "kniga", "README"), "books/1/kniga");
        assert_eq!(media_path(MediaCategory::Books, 1, "kniga", "file."), "books/1/kniga");
        assert_eq!(media_path(MediaCategory::Books, 1, "kniga", "a.p-g"), "books/1/kniga");
    }

    #[test]
    fn renamed_path_keeps_directory_and_extension() {
        assert_eq!(renamed_path("books/12/old.pdf", "new"), "books/12/new.pdf");
        assert_eq!(renamed_path("books/12/old", "new"), "books/12/new");
    }

    #[tokio::test]
    async fn fs_storage_writes_renames_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsMediaStorage::new(dir.path());

        storage.save("books/1/a.txt", b"hello").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("books/1/a.txt")).unwrap(), b"hello");

        storage.rename("books/1/a.txt", "books/1/b.txt").await.unwrap();
        assert!(!dir.path().join("books/1/a.txt").exists());
        assert!(dir.path().join("books/1/b.txt").exists());

        storage.remove("books/1/missing.txt").await.unwrap();
        storage.remove_dir("books/1").await.unwrap();
        assert!(!dir.path().join("books/1").exists());
        storage.remove_dir("books/1").await.unwrap();
    }

    #[tokio::test]
    async fn fs_storage_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsMediaStorage::new(dir.path());
        assert!(storage.save("../outside.txt", b"x").await.is_err());
        assert!(storage.save("/etc/passwd", b"x").await.is_err());
    }
}
