use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::api::error;
use crate::modules::file_manager::model::StorageConfig;

/// Storage backend for banner images, addressed by file name.
#[async_trait::async_trait]
pub trait FileManager: Send + Sync {
    /// Generate a unique file name with the given extension.
    fn generate_file_name(&self, extension: &str) -> String;

    /// Storage path of a file.
    fn get_image_src(&self, file_name: &str) -> PathBuf;

    /// Public URL of a file.
    fn get_image_url(&self, file_name: &str) -> String;

    /// Check an upload against the size and MIME type limits.
    fn validate_upload(&self, file_size: usize, mime_type: &str) -> Result<(), error::SystemError>;

    /// Write bytes under `file_name`. Write failures are `SystemError::Upload`.
    async fn save_file(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, error::SystemError>;

    /// Delete a file, returning whether it was removed.
    async fn delete_file(&self, file_name: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct LocalFileManager {
    config: StorageConfig,
}

impl LocalFileManager {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl FileManager for LocalFileManager {
    fn generate_file_name(&self, extension: &str) -> String {
        let extension = extension.trim_start_matches('.');
        let uuid = Uuid::now_v7();
        if extension.is_empty() {
            uuid.to_string()
        } else {
            format!("{}.{}", uuid, extension)
        }
    }

    fn get_image_src(&self, file_name: &str) -> PathBuf {
        // Only the final component is kept so a stored name cannot escape the upload dir.
        let name = Path::new(file_name).file_name().unwrap_or_default();
        Path::new(&self.config.upload_dir).join(name)
    }

    fn get_image_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), file_name)
    }

    fn validate_upload(&self, file_size: usize, mime_type: &str) -> Result<(), error::SystemError> {
        // Check file size
        if file_size > self.config.max_file_size {
            return Err(error::SystemError::bad_request(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        // Check MIME type
        if !self.config.allowed_mime_types.iter().any(|allowed| allowed == mime_type) {
            return Err(error::SystemError::bad_request(format!(
                "File type '{}' is not allowed",
                mime_type
            )));
        }

        Ok(())
    }

    async fn save_file(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, error::SystemError> {
        // Create upload directory if it doesn't exist
        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(|e| error::SystemError::upload(&e))?;

        let file_path = self.get_image_src(file_name);
        tokio::fs::write(&file_path, bytes).await.map_err(|e| {
            log::error!("Cannot write {}: {}", file_path.display(), e);
            error::SystemError::upload(&e)
        })?;

        Ok(file_path)
    }

    async fn delete_file(&self, file_name: &str) -> bool {
        if file_name.is_empty() {
            return false;
        }

        match tokio::fs::remove_file(self.get_image_src(file_name)).await {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Cannot delete \"{}\" file: {}", file_name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &Path) -> LocalFileManager {
        LocalFileManager::new(StorageConfig {
            upload_dir: dir.to_string_lossy().into_owned(),
            base_url: "/uploads/banners/".to_string(),
            ..StorageConfig::default()
        })
    }

    #[test]
    fn generated_names_are_unique_and_keep_extension() {
        let files = LocalFileManager::new(StorageConfig::default());
        let a = files.generate_file_name("png");
        let b = files.generate_file_name(".png");
        assert!(a.ends_with(".png"));
        assert!(b.ends_with(".png") && !b.ends_with("..png"));
        assert_ne!(a, b);
        assert!(!files.generate_file_name("").contains('.'));
    }

    #[test]
    fn image_src_stays_inside_upload_dir() {
        let files = LocalFileManager::new(StorageConfig::default());
        assert_eq!(
            files.get_image_src("../../etc/passwd"),
            Path::new("./uploads/banners").join("passwd")
        );
        assert_eq!(files.get_image_url("a.png"), "/uploads/banners/a.png");
    }

    #[test]
    fn validate_upload_rejects_size_and_type() {
        let files = LocalFileManager::new(StorageConfig::default());
        assert!(files.validate_upload(10, "image/png").is_ok());
        assert!(files.validate_upload(10, "application/pdf").is_err());
        assert!(files.validate_upload(6 * 1024 * 1024, "image/png").is_err());
    }

    #[tokio::test]
    async fn save_then_delete_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = manager(&dir.path().join("nested"));

        let path = files.save_file("banner.png", b"png-bytes").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
        assert_eq!(files.get_image_url("banner.png"), "/uploads/banners/banner.png");

        assert!(files.delete_file("banner.png").await);
        assert!(!path.exists());
        assert!(!files.delete_file("banner.png").await);
        assert!(!files.delete_file("").await);
    }

    #[tokio::test]
    async fn save_file_reports_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let files = manager(&blocker);

        let err = files.save_file("banner.png", b"png").await.unwrap_err();
        assert!(matches!(err, error::SystemError::Upload { .. }));
    }
}
