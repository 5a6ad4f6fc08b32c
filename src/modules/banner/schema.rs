use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "banner_link_target", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    #[default]
    #[sqlx(rename = "self")]
    #[serde(rename = "self")]
    SelfWindow,
    #[sqlx(rename = "blank")]
    #[serde(rename = "blank")]
    Blank,
}

#[derive(Debug, Clone, FromRow)]
pub struct BannerEntity {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub position: i32,
    pub link_target: LinkTarget,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BannerTranslationEntity {
    pub banner_id: i64,
    pub language: String,
    pub title: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub file_name: String,
}
