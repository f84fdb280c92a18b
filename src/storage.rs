use std::path::{Component, Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use sqlx::types::Uuid;
use tracing::{debug, info};

use crate::errors::AppError;

/// Thumbnail files kept flat in one upload directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates the directory if needed.
    pub fn init(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;
        info!(dir = %root.display(), "upload directory ready");
        Ok(FileStorage { root })
    }

    /// Decodes a base64 upload, writes it under a fresh name and returns that name.
    pub async fn store_base64(&self, original_name: &str, data: &str) -> Result<String, AppError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|_| AppError::BadRequest("Thumbnail is not valid base64.".into()))?;

        self.store(original_name, &bytes).await
    }

    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Failed to store empty file.".into()));
        }

        let filename = format!("{}{}", Uuid::new_v4(), extension_of(original_name));
        let destination = self
            .resolve(&filename)
            .ok_or_else(|| AppError::BadRequest("Cannot store file outside current directory.".into()))?;

        let contents = bytes.to_vec();
        actix_web::rt::task::spawn_blocking(move || std::fs::write(destination, contents))
            .await
            .map_err(AppError::internal)?
            .map_err(AppError::internal)?;

        debug!(file = %filename, size = bytes.len(), "stored upload");
        Ok(filename)
    }

    /// Path of a stored file, or `None` when the name would leave the upload directory.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.root.join(name)),
            _ => None,
        }
    }

    pub async fn remove(&self, filename: &str) {
        let Some(path) = self.resolve(filename) else {
            return;
        };

        match actix_web::rt::task::spawn_blocking(move || std::fs::remove_file(path)).await {
            Ok(Ok(())) => debug!(file = filename, "removed upload"),
            Ok(Err(e)) => debug!(error = %e, file = filename, "could not remove upload"),
            Err(e) => debug!(error = %e, file = filename, "could not remove upload"),
        }
    }
}

/// Extension including the dot, taken from the client's file name.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> FileStorage {
        FileStorage::init(std::env::temp_dir().join(format!("edugate-storage-{}", Uuid::new_v4()))).unwrap()
    }

    #[test]
    fn extension_is_kept_and_sanitized() {
        assert_eq!(extension_of("cover.PNG"), ".png");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of("bad.p/ng"), "");
    }

    #[test]
    fn resolve_rejects_escaping_names() {
        let storage = temp_storage();
        assert!(storage.resolve("../etc/passwd").is_none());
        assert!(storage.resolve("nested/file.png").is_none());
        assert!(storage.resolve("/abs.png").is_none());
        assert!(storage.resolve("..").is_none());
        assert!(storage.resolve("a.png").unwrap().ends_with("a.png"));
    }

    #[actix_web::test]
    async fn stores_decoded_bytes_under_a_fresh_name() {
        let storage = temp_storage();
        let name = storage.store_base64("thumb.png", &STANDARD.encode(b"png-bytes")).await.unwrap();

        assert!(name.ends_with(".png"));
        assert_ne!(name, "thumb.png");
        assert_eq!(std::fs::read(storage.resolve(&name).unwrap()).unwrap(), b"png-bytes");
    }

    #[actix_web::test]
    async fn rejects_empty_and_undecodable_uploads() {
        let storage = temp_storage();
        assert!(matches!(storage.store("x.png", b"").await, Err(AppError::BadRequest(_))));
        assert!(matches!(storage.store_base64("x.png", "!!not base64!!").await, Err(AppError::BadRequest(_))));
    }
}
