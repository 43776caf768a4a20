use crate::config::KNOWN_EXTENSIONS;
use crate::error::ServiceError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem-backed store for raw image blobs
///
/// One file per image, named `{image_id}.{ext}`. Blobs are written
/// exactly once at upload time and never mutated; the analysis engine
/// only tests existence. Safe for concurrent multi-process access since
/// every key is written at most once.
pub struct FsBlobStore {
    images_dir: PathBuf,
}

impl FsBlobStore {
    /// Create a blob store rooted at the given directory
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    /// Persist image bytes under `{image_id}.{extension}`
    pub async fn save(
        &self,
        image_id: &str,
        extension: &str,
        content: &[u8],
    ) -> Result<PathBuf, ServiceError> {
        tokio::fs::create_dir_all(&self.images_dir)
            .await
            .map_err(|e| ServiceError::storage("create images directory", e))?;

        let path = self.blob_path(image_id, extension);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ServiceError::storage("write image blob", e))?;

        debug!(image_id = %image_id, path = %path.display(), "Image blob written");
        Ok(path)
    }

    /// Check whether a blob exists for the identifier under any known extension
    pub async fn exists(&self, image_id: &str) -> Result<bool, ServiceError> {
        for ext in KNOWN_EXTENSIONS {
            let path = self.blob_path(image_id, ext);
            let found = tokio::fs::try_exists(&path)
                .await
                .map_err(|e| ServiceError::storage("check image existence", e))?;
            if found {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn blob_path(&self, image_id: &str, extension: &str) -> PathBuf {
        self.images_dir
            .join(format!("{}.{}", sanitize_key(image_id), extension))
    }

    /// Root directory of this store
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}

/// Sanitize an identifier used as a filename to prevent path traversal
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_then_exists() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().join("images"));

        assert!(!store.exists("img-1").await.unwrap());

        let path = store.save("img-1", "png", b"not a real png").await.unwrap();
        assert!(path.ends_with("img-1.png"));
        assert!(store.exists("img-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_checks_all_known_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().join("images"));

        store.save("img-jpg", "jpg", b"jpeg bytes").await.unwrap();
        assert!(store.exists("img-jpg").await.unwrap());
        assert!(!store.exists("img-other").await.unwrap());
    }

    #[tokio::test]
    async fn test_sanitize_key_blocks_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().join("images"));

        let path = store.save("../escape", "jpg", b"x").await.unwrap();
        assert!(path.starts_with(temp_dir.path().join("images")));
        assert_eq!(sanitize_key("../escape"), "___escape");
    }
}
