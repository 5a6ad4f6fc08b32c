use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error;
use crate::modules::banner::schema::{BannerEntity, BannerTranslationEntity, LinkTarget};
use crate::modules::file_manager::{FileManager, UploadedImage};
use crate::utils::{double_option, Pagination};

/// Working copy of a banner and its translations.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Banner {
    /// `None` until the banner is persisted.
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    pub is_active: bool,
    #[validate(range(min = 0, message = "Position cannot be negative"))]
    pub position: i32,
    pub link_target: LinkTarget,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[validate(nested)]
    pub translations: Vec<BannerTranslation>,
}

impl Default for Banner {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            is_active: true,
            position: 0,
            link_target: LinkTarget::default(),
            created_at: None,
            updated_at: None,
            translations: Vec::new(),
        }
    }
}

impl Banner {
    pub fn from_entities(entity: BannerEntity, translations: Vec<BannerTranslationEntity>) -> Self {
        let mut translations: Vec<BannerTranslation> =
            translations.into_iter().map(BannerTranslation::from).collect();
        translations.sort_by(|a, b| a.language.cmp(&b.language));

        Self {
            id: Some(entity.id),
            name: entity.name,
            is_active: entity.is_active,
            position: entity.position,
            link_target: entity.link_target,
            created_at: Some(entity.created_at),
            updated_at: Some(entity.updated_at),
            translations,
        }
    }

    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    pub fn translation(&self, language: &str) -> Option<&BannerTranslation> {
        self.translations.iter().find(|t| t.language == language)
    }

    /// Fetch the translation for `language`, creating an empty one if missing.
    pub fn get_translation(&mut self, language: &str) -> &mut BannerTranslation {
        let index = match self.translations.iter().position(|t| t.language == language) {
            Some(index) => index,
            None => {
                let index = self
                    .translations
                    .binary_search_by(|t| t.language.as_str().cmp(language))
                    .unwrap_or_else(|insert_at| insert_at);
                self.translations.insert(index, BannerTranslation::new(language));
                index
            }
        };
        &mut self.translations[index]
    }

    pub fn ensure_translations(&mut self, languages: &[String]) {
        for language in languages {
            self.get_translation(language);
        }
    }

    /// Write the posted non-localized attributes; absent keys keep their value.
    pub fn apply(&mut self, form: &BannerForm) {
        if let Some(name) = &form.name {
            self.name = name.trim().to_string();
        }
        if let Some(is_active) = form.is_active {
            self.is_active = is_active;
        }
        if let Some(position) = form.position {
            self.position = position;
        }
        if let Some(link_target) = form.link_target {
            self.link_target = link_target;
        }
    }

    /// The aggregate as it should be written: persisted translations plus new ones
    /// that received data in this request.
    pub fn persistable(&self) -> Banner {
        Banner {
            translations: self
                .translations
                .iter()
                .filter(|t| !t.is_new || t.is_dirty)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Non-empty file names referenced by the translations.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.translations.iter().map(|t| t.file_name.as_str()).filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct BannerTranslation {
    pub language: String,
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    pub content: Option<String>,
    #[validate(length(max = 2048, message = "Link is too long"))]
    pub link: Option<String>,
    /// Stored image, empty when the translation has none.
    pub file_name: String,
    pub is_new: bool,
    pub is_dirty: bool,
}

impl BannerTranslation {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            title: String::new(),
            content: None,
            link: None,
            file_name: String::new(),
            is_new: true,
            is_dirty: false,
        }
    }

    pub fn apply(&mut self, form: &TranslationForm) {
        if let Some(title) = &form.title {
            self.title = title.trim().to_string();
        }
        if let Some(content) = &form.content {
            self.content = content.clone();
        }
        if let Some(link) = &form.link {
            self.link = link.as_ref().map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        }
        self.is_dirty = true;
    }
}

impl From<BannerTranslationEntity> for BannerTranslation {
    fn from(entity: BannerTranslationEntity) -> Self {
        Self {
            language: entity.language,
            title: entity.title,
            content: entity.content,
            link: entity.link,
            file_name: entity.file_name,
            is_new: false,
            is_dirty: false,
        }
    }
}

/// Posted banner attributes. Keys outside this list are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BannerForm {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub position: Option<i32>,
    pub link_target: Option<LinkTarget>,
    #[serde(default)]
    pub translations: BTreeMap<String, TranslationForm>,
}

impl BannerForm {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.is_active.is_none()
            && self.position.is_none()
            && self.link_target.is_none()
            && self.translations.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationForm {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub content: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
}

/// Everything a save request carries: the posted form and the images keyed by language.
#[derive(Debug, Clone, Default)]
pub struct BannerData {
    pub fields: serde_json::Value,
    pub images: HashMap<String, UploadedImage>,
}

impl BannerData {
    pub fn new(fields: serde_json::Value) -> Self {
        Self { fields, images: HashMap::new() }
    }

    pub fn with_image(mut self, language: impl Into<String>, image: UploadedImage) -> Self {
        self.images.insert(language.into(), image);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerSortField {
    Id,
    Name,
    Position,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

impl BannerSortField {
    pub fn column(&self) -> &'static str {
        match self {
            BannerSortField::Id => "id",
            BannerSortField::Name => "name",
            BannerSortField::Position => "position",
            BannerSortField::IsActive => "is_active",
            BannerSortField::CreatedAt => "created_at",
            BannerSortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: BannerSortField,
    pub descending: bool,
}

/// Ordering of a banner listing, written as `position,-created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerSort(pub Vec<SortOrder>);

impl BannerSort {
    /// Orders with `id` appended as a tie breaker so pages are stable.
    pub fn orders(&self) -> Vec<SortOrder> {
        let mut orders = self.0.clone();
        if !orders.iter().any(|o| o.field == BannerSortField::Id) {
            orders.push(SortOrder { field: BannerSortField::Id, descending: false });
        }
        orders
    }

    pub fn to_sql(&self) -> String {
        self.orders()
            .iter()
            .map(|o| format!("{} {}", o.field.column(), if o.descending { "DESC" } else { "ASC" }))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for BannerSort {
    fn default() -> Self {
        Self(vec![SortOrder { field: BannerSortField::Position, descending: false }])
    }
}

impl FromStr for BannerSort {
    type Err = error::SystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut orders = Vec::new();
        for key in s.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            let (descending, name) = match key.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, key),
            };
            let field = match name {
                "id" => BannerSortField::Id,
                "name" => BannerSortField::Name,
                "position" => BannerSortField::Position,
                "is_active" => BannerSortField::IsActive,
                "created_at" => BannerSortField::CreatedAt,
                "updated_at" => BannerSortField::UpdatedAt,
                other => {
                    return Err(error::SystemError::bad_request(format!(
                        "Cannot sort banners by '{other}'"
                    )))
                }
            };
            if orders.iter().any(|o: &SortOrder| o.field == field) {
                continue;
            }
            orders.push(SortOrder { field, descending });
        }

        if orders.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self(orders))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BannerQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
}

impl BannerQuery {
    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
        .normalize()
    }

    pub fn sort(&self) -> Result<BannerSort, error::SystemError> {
        match &self.sort {
            Some(sort) => sort.parse(),
            None => Ok(BannerSort::default()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    pub language: String,
    pub title: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub file_name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub id: Option<i64>,
    pub name: String,
    pub is_active: bool,
    pub position: i32,
    pub link_target: LinkTarget,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub translations: Vec<TranslationResponse>,
}

impl BannerResponse {
    pub fn from_model(banner: Banner, files: &dyn FileManager) -> Self {
        BannerResponse {
            id: banner.id,
            name: banner.name,
            is_active: banner.is_active,
            position: banner.position,
            link_target: banner.link_target,
            created_at: banner.created_at,
            updated_at: banner.updated_at,
            translations: banner
                .translations
                .into_iter()
                .map(|t| TranslationResponse {
                    image_url: (!t.file_name.is_empty()).then(|| files.get_image_url(&t.file_name)),
                    language: t.language,
                    title: t.title,
                    content: t.content,
                    link: t.link,
                    file_name: t.file_name,
                })
                .collect(),
        }
    }
}
