pub mod banner;
pub mod file_manager;
pub mod language;
