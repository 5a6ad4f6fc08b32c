use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    api::error,
    modules::{
        banner::{repository::BannerRepository, repository_pg::BannerRepositoryPg, service::BannerService},
        file_manager::{FileManager, LocalFileManager, StorageConfig},
        language::{ConfigLanguageProvider, LanguageProvider},
    },
    ENV,
};

pub async fn connect_database() -> Result<PgPool, error::SystemError> {
    let database_url = &ENV.database_url;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Configuration of the banner module, passed explicitly at startup.
#[derive(Debug, Clone, Default)]
pub struct ModuleConfig {
    /// Comma separated language codes, e.g. `en,fr,pt-BR`. Required.
    pub languages: Option<String>,
    pub storage: StorageConfig,
}

impl ModuleConfig {
    pub fn from_env() -> Self {
        ModuleConfig {
            languages: ENV.banner_languages.clone(),
            storage: StorageConfig {
                max_file_size: ENV.max_upload_size,
                upload_dir: ENV.upload_dir.clone(),
                base_url: ENV.upload_base_url.clone(),
                ..StorageConfig::default()
            },
        }
    }
}

/// The banner module's collaborators, wired once at startup.
#[derive(Clone)]
pub struct BannerModule {
    pub languages: Arc<dyn LanguageProvider>,
    pub files: Arc<dyn FileManager>,
    pub repo: Arc<dyn BannerRepository + Send + Sync>,
}

impl BannerModule {
    pub fn init(config: ModuleConfig, pool: PgPool) -> Result<Self, error::SystemError> {
        Self::with_repository(config, Arc::new(BannerRepositoryPg::new(pool)))
    }

    /// Fails when no language provider is configured.
    pub fn with_repository(
        config: ModuleConfig,
        repo: Arc<dyn BannerRepository + Send + Sync>,
    ) -> Result<Self, error::SystemError> {
        let languages = match config.languages.as_deref() {
            Some(list) => ConfigLanguageProvider::from_list(list)?,
            None => return Err(error::SystemError::config("You should configure language provider")),
        };

        Ok(BannerModule {
            languages: Arc::new(languages),
            files: Arc::new(LocalFileManager::new(config.storage)),
            repo,
        })
    }

    pub fn service(&self) -> BannerService {
        BannerService::with_dependencies(self.repo.clone(), self.files.clone(), self.languages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::InMemoryBannerRepository;

    #[test]
    fn init_fails_without_language_provider() {
        let repo = Arc::new(InMemoryBannerRepository::default());
        for languages in [None, Some(String::new()), Some(" , ".to_string())] {
            let config = ModuleConfig { languages, ..ModuleConfig::default() };
            let err = BannerModule::with_repository(config, repo.clone()).err().unwrap();
            assert!(matches!(err, error::SystemError::Config(_)));
        }
    }

    #[tokio::test]
    async fn init_wires_service() {
        let config = ModuleConfig {
            languages: Some("en, uk".into()),
            ..ModuleConfig::default()
        };
        let module =
            BannerModule::with_repository(config, Arc::new(InMemoryBannerRepository::default()))
                .unwrap();
        assert_eq!(module.languages.languages(), vec!["en", "uk"]);

        let mut service = module.service();
        let model = service.get_model(None).await.unwrap();
        let languages: Vec<_> = model.translations.iter().map(|t| t.language.as_str()).collect();
        assert_eq!(languages, vec!["en", "uk"]);
    }
}
