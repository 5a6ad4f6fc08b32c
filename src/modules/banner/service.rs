use std::collections::BTreeSet;
use std::sync::Arc;

use log::info;
use validator::Validate;

use crate::api::error;
use crate::modules::banner::{
    data_provider::BannerDataProvider,
    model::{Banner, BannerData, BannerForm},
    repository::BannerRepository,
};
use crate::modules::file_manager::{FileManager, UploadedImage};
use crate::modules::language::LanguageProvider;

/// A file written during a save, kept until the outcome is known.
#[derive(Debug)]
struct PendingFile {
    previous: String,
    current: String,
    replaces_stored: bool,
}

/// CRUD over banners. Clone it per request: the working model is request state,
/// the collaborators are shared.
#[derive(Clone)]
pub struct BannerService {
    repo: Arc<dyn BannerRepository + Send + Sync>,
    files: Arc<dyn FileManager>,
    languages: Arc<dyn LanguageProvider>,
    model: Option<Banner>,
}

impl BannerService {
    pub fn with_dependencies(
        repo: Arc<dyn BannerRepository + Send + Sync>,
        files: Arc<dyn FileManager>,
        languages: Arc<dyn LanguageProvider>,
    ) -> Self {
        info!("BannerService initialized with dependencies");
        BannerService { repo, files, languages, model: None }
    }

    pub fn file_manager(&self) -> &dyn FileManager {
        self.files.as_ref()
    }

    /// The current working model, set by `get_model`.
    pub fn model(&self) -> Option<&Banner> {
        self.model.as_ref()
    }

    pub fn get_data_provider(&self) -> BannerDataProvider {
        BannerDataProvider::new(self.repo.clone())
    }

    async fn find_model(&self, id: i64) -> Result<Banner, error::SystemError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Banner not found"))
    }

    /// A new banner with default values when `id` is `None`, the stored one otherwise.
    /// Either way it becomes the working model, with a translation for every language.
    pub async fn get_model(&mut self, id: Option<i64>) -> Result<&Banner, error::SystemError> {
        let mut model = match id {
            None => Banner::default(),
            Some(id) => self.find_model(id).await?,
        };
        model.ensure_translations(&self.languages.languages());
        Ok(&*self.model.insert(model))
    }

    /// Write an uploaded image under a fresh name and return that name.
    async fn save_uploaded_file(
        files: &dyn FileManager,
        upload: &UploadedImage,
    ) -> Result<String, error::SystemError> {
        files.validate_upload(upload.size(), &upload.mime_type)?;

        let file_name = files.generate_file_name(&upload.extension());
        files.save_file(&file_name, &upload.bytes).await?;

        Ok(file_name)
    }

    async fn save_internal(
        &mut self,
        data: BannerData,
        pending: &mut Vec<PendingFile>,
    ) -> Result<Banner, error::SystemError> {
        let form: BannerForm = serde_json::from_value(data.fields).map_err(|e| {
            error::SystemError::bind(format!("Cannot load data to primary model: {e}"))
        })?;
        if form.is_empty() && data.images.is_empty() {
            return Err(error::SystemError::bind("Cannot load data to primary model"));
        }

        let files = self.files.as_ref();
        let model = self
            .model
            .as_mut()
            .ok_or_else(|| error::SystemError::bind("No banner model loaded"))?;

        model.apply(&form);

        let mut languages: BTreeSet<&str> = form.translations.keys().map(String::as_str).collect();
        languages.extend(data.images.keys().map(String::as_str));

        for language in languages {
            if !self.languages.is_supported(language) {
                return Err(error::SystemError::bind(format!(
                    "Language '{language}' is not supported"
                )));
            }

            let translation = model.get_translation(language);

            if let Some(upload) = data.images.get(language) {
                let file_name = Self::save_uploaded_file(files, upload).await?;
                pending.push(PendingFile {
                    previous: translation.file_name.clone(),
                    current: file_name.clone(),
                    replaces_stored: !translation.is_new && !translation.file_name.is_empty(),
                });
                translation.file_name = file_name;
                translation.is_dirty = true;
            }

            if let Some(fields) = form.translations.get(language) {
                translation.apply(fields);
            }
        }

        let banner = model.persistable();
        banner.validate()?;

        self.repo.save(&banner).await.map_err(|e| match e {
            error::SystemError::Persist(_) => e,
            other => error::SystemError::persist(other.to_string()),
        })
    }

    /// Bind `data` onto the working model, store uploads and persist the aggregate.
    ///
    /// Replaced images are removed only once the banner is persisted. On failure the
    /// images written by this call are removed again and the working model is restored
    /// to its state before the call. Errors are logged before being returned.
    pub async fn try_save(&mut self, data: BannerData) -> Result<(), error::SystemError> {
        let mut pending = Vec::new();
        let previous = self.model.clone();

        match self.save_internal(data, &mut pending).await {
            Ok(mut saved) => {
                for file in pending.iter().filter(|f| f.replaces_stored) {
                    if !self.files.delete_file(&file.previous).await {
                        tracing::debug!(file_name = %file.previous, "Cannot delete replaced banner image");
                    }
                }

                tracing::info!(banner_id = ?saved.id, uploads = pending.len(), "Banner saved");
                saved.ensure_translations(&self.languages.languages());
                self.model = Some(saved);
                Ok(())
            }
            Err(err) => {
                self.model = previous;
                for file in &pending {
                    if !self.files.delete_file(&file.current).await {
                        tracing::debug!(file_name = %file.current, "Cannot delete orphaned banner image");
                    }
                }

                tracing::error!(
                    banner_id = ?self.model.as_ref().and_then(|m| m.id),
                    error = ?err,
                    "Cannot save banner"
                );
                Err(err)
            }
        }
    }

    /// `try_save` collapsed to success or failure.
    pub async fn save(&mut self, data: BannerData) -> bool {
        self.try_save(data).await.is_ok()
    }

    async fn delete_model(&self, model: &Banner) -> Result<bool, error::SystemError> {
        for file_name in model.file_names() {
            if !self.files.delete_file(file_name).await {
                tracing::debug!(file_name, "Cannot delete banner image");
            }
        }

        match model.id {
            Some(id) => self.repo.delete(id).await,
            None => Ok(false),
        }
    }

    /// Remove a banner and, best effort, its images. A missing banner is `NotFound`;
    /// any later failure is logged and reported as `Ok(false)`.
    pub async fn delete(&self, id: i64) -> Result<bool, error::SystemError> {
        let model = self.find_model(id).await?;

        match self.delete_model(&model).await {
            Ok(deleted) => Ok(deleted),
            Err(err) => {
                tracing::error!(banner_id = id, error = ?err, "Cannot delete banner");
                Ok(false)
            }
        }
    }

    /// `delete` with the failure cause kept.
    pub async fn try_delete(&self, id: i64) -> Result<(), error::SystemError> {
        let model = self.find_model(id).await?;

        let deleted = self.delete_model(&model).await.inspect_err(|err| {
            tracing::error!(banner_id = id, error = ?err, "Cannot delete banner");
        })?;

        if deleted {
            Ok(())
        } else {
            Err(error::SystemError::not_found("Banner not found"))
        }
    }
}
