#![cfg(test)]
//! In-memory collaborators for service and handler tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64};
use std::sync::{atomic, Arc, Mutex};

use crate::{
    api::error,
    modules::{
        banner::{
            model::{Banner, BannerSort, BannerSortField},
            repository::BannerRepository,
            service::BannerService,
        },
        file_manager::{FileManager, LocalFileManager, StorageConfig, UploadedImage},
        language::ConfigLanguageProvider,
    },
    utils::Pagination,
};

pub fn png(name: &str) -> UploadedImage {
    UploadedImage::new(name, b"\x89PNG\r\n\x1a\n".to_vec())
}

#[derive(Default)]
pub struct InMemoryBannerRepository {
    banners: Mutex<BTreeMap<i64, Banner>>,
    next_id: AtomicI64,
    fail_saves: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryBannerRepository {
    pub fn stored(&self, id: i64) -> Option<Banner> {
        self.banners.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.banners.lock().unwrap().len()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, atomic::Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, atomic::Ordering::SeqCst);
    }
}

fn compare(a: &Banner, b: &Banner, field: BannerSortField) -> Ordering {
    match field {
        BannerSortField::Id => a.id.cmp(&b.id),
        BannerSortField::Name => a.name.cmp(&b.name),
        BannerSortField::Position => a.position.cmp(&b.position),
        BannerSortField::IsActive => a.is_active.cmp(&b.is_active),
        BannerSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        BannerSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait::async_trait]
impl BannerRepository for InMemoryBannerRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Banner>, error::SystemError> {
        Ok(self.stored(id))
    }

    async fn find_page(
        &self,
        pagination: Pagination,
        sort: &BannerSort,
    ) -> Result<(Vec<Banner>, i64), error::SystemError> {
        let mut all: Vec<Banner> = self.banners.lock().unwrap().values().cloned().collect();
        let orders = sort.orders();
        all.sort_by(|a, b| {
            orders
                .iter()
                .map(|o| {
                    let ord = compare(a, b, o.field);
                    if o.descending { ord.reverse() } else { ord }
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((items, total))
    }

    async fn save(&self, banner: &Banner) -> Result<Banner, error::SystemError> {
        if self.fail_saves.load(atomic::Ordering::SeqCst) {
            return Err(error::SystemError::DatabaseError("connection reset".into()));
        }

        let now = chrono::Utc::now();
        let mut banners = self.banners.lock().unwrap();
        let mut stored = match banner.id {
            None => {
                let id = self.next_id.fetch_add(1, atomic::Ordering::SeqCst) + 1;
                Banner { id: Some(id), created_at: Some(now), translations: Vec::new(), ..banner.clone() }
            }
            Some(id) => {
                let existing =
                    banners.get(&id).ok_or_else(|| error::SystemError::not_found("Banner not found"))?;
                Banner {
                    translations: existing.translations.clone(),
                    created_at: existing.created_at,
                    ..banner.clone()
                }
            }
        };
        stored.updated_at = Some(now);

        for translation in &banner.translations {
            let row = stored.get_translation(&translation.language);
            *row = translation.clone();
            row.is_new = false;
            row.is_dirty = false;
        }

        let id = stored.id.unwrap_or_default();
        banners.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<bool, error::SystemError> {
        if self.fail_deletes.load(atomic::Ordering::SeqCst) {
            return Err(error::SystemError::DatabaseError("connection reset".into()));
        }
        Ok(self.banners.lock().unwrap().remove(&id).is_some())
    }
}

/// Real files in a temp dir, with every write and delete recorded.
pub struct RecordingFileManager {
    inner: LocalFileManager,
    _dir: tempfile::TempDir,
    fail_writes: AtomicBool,
    undeletable: Mutex<HashSet<String>>,
    written: Mutex<Vec<String>>,
    delete_attempts: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl RecordingFileManager {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let inner = LocalFileManager::new(StorageConfig {
            upload_dir: dir.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        });
        Self {
            inner,
            _dir: dir,
            fail_writes: AtomicBool::new(false),
            undeletable: Mutex::new(HashSet::new()),
            written: Mutex::new(Vec::new()),
            delete_attempts: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, atomic::Ordering::SeqCst);
    }

    pub fn fail_delete_of(&self, file_name: &str) {
        self.undeletable.lock().unwrap().insert(file_name.to_string());
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.inner.get_image_src(file_name).exists()
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FileManager for RecordingFileManager {
    fn generate_file_name(&self, extension: &str) -> String {
        self.inner.generate_file_name(extension)
    }

    fn get_image_src(&self, file_name: &str) -> PathBuf {
        self.inner.get_image_src(file_name)
    }

    fn get_image_url(&self, file_name: &str) -> String {
        self.inner.get_image_url(file_name)
    }

    fn validate_upload(&self, file_size: usize, mime_type: &str) -> Result<(), error::SystemError> {
        self.inner.validate_upload(file_size, mime_type)
    }

    async fn save_file(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, error::SystemError> {
        if self.fail_writes.load(atomic::Ordering::SeqCst) {
            return Err(error::SystemError::upload(&std::io::Error::from_raw_os_error(28)));
        }
        let path = self.inner.save_file(file_name, bytes).await?;
        self.written.lock().unwrap().push(file_name.to_string());
        Ok(path)
    }

    async fn delete_file(&self, file_name: &str) -> bool {
        self.delete_attempts.lock().unwrap().push(file_name.to_string());
        let undeletable = self.undeletable.lock().unwrap().contains(file_name);
        if undeletable {
            return false;
        }
        let deleted = self.inner.delete_file(file_name).await;
        if deleted {
            self.deleted.lock().unwrap().push(file_name.to_string());
        }
        deleted
    }
}

pub struct TestContext {
    pub repo: Arc<InMemoryBannerRepository>,
    pub files: Arc<RecordingFileManager>,
    pub languages: Arc<ConfigLanguageProvider>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_languages("en,fr")
    }

    pub fn with_languages(list: &str) -> Self {
        Self {
            repo: Arc::new(InMemoryBannerRepository::default()),
            files: Arc::new(RecordingFileManager::new()),
            languages: Arc::new(ConfigLanguageProvider::from_list(list).unwrap()),
        }
    }

    /// A fresh request-scoped service over the shared collaborators.
    pub fn service(&self) -> BannerService {
        BannerService::with_dependencies(self.repo.clone(), self.files.clone(), self.languages.clone())
    }
}
