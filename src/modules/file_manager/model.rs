use std::path::Path;

/// Storage configuration for banner images
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub upload_dir: String,
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024, // 5MB
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
                "image/svg+xml".to_string(),
            ],
            upload_dir: "./uploads/banners".to_string(),
            base_url: "/uploads/banners".to_string(),
        }
    }
}

/// An image received in the current request, not yet written to storage.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let original_name = original_name.into();
        let mime_type = mime_guess::from_path(&original_name).first_or_octet_stream().to_string();
        Self { original_name, mime_type, bytes }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercase extension of the client file name, falling back to the MIME type.
    pub fn extension(&self) -> String {
        let from_name = Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty());

        match from_name {
            Some(ext) => ext.to_ascii_lowercase(),
            None => mime_guess::get_mime_extensions_str(&self.mime_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
                .unwrap_or_default(),
        }
    }
}
