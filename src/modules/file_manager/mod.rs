pub mod model;
pub mod service;

pub use model::{StorageConfig, UploadedImage};
pub use service::{FileManager, LocalFileManager};
