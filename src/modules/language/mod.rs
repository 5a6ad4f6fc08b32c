pub mod provider;

pub use provider::{ConfigLanguageProvider, LanguageProvider};
