use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::utils::error::AppError;

pub const PUBLIC_PREFIX: &str = "/uploads/";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Event images on local disk, served back under [`PUBLIC_PREFIX`].
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores the image under a generated name and returns its public path.
    /// The client's file name only contributes its extension.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::ValidationError("image is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::ValidationError(format!(
                "image exceeds {} bytes",
                self.max_bytes
            )));
        }

        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                AppError::ValidationError(format!(
                    "image must be one of: {}",
                    ALLOWED_EXTENSIONS.join(", ")
                ))
            })?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Stored event image");
        Ok(format!("{PUBLIC_PREFIX}{file_name}"))
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, public_path: &str) {
        let Some(file_name) = public_path.strip_prefix(PUBLIC_PREFIX) else {
            return;
        };
        // Generated names never contain separators
        if file_name.is_empty() || file_name.contains(|c: char| c == '/' || c == '\\') || file_name.contains("..") {
            return;
        }

        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => tracing::debug!(file = %file_name, "Removed event image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %file_name, error = %e, "Failed to remove event image"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_generates_name_and_remove_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 1024);

        let path = store.save(Some("../../etc/Poster.PNG"), b"img").await.unwrap();
        assert!(path.starts_with(PUBLIC_PREFIX));
        assert!(path.ends_with(".png"));
        assert!(!path.contains("Poster"));

        let on_disk = dir.path().join(path.trim_start_matches(PUBLIC_PREFIX));
        assert!(on_disk.exists());

        store.remove(&path).await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 4);

        assert!(store.save(Some("a.png"), b"").await.is_err());
        assert!(store.save(Some("a.png"), b"too big").await.is_err());
        assert!(store.save(Some("a.exe"), b"ok").await.is_err());
        assert!(store.save(None, b"ok").await.is_err());
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 4);

        store.remove("").await;
        store.remove("/uploads/../secret").await;
        store.remove("https://cdn.example/x.png").await;
    }
}
