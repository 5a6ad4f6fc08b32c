use crate::{
    api::error,
    modules::banner::model::{Banner, BannerSort},
    utils::Pagination,
};

#[async_trait::async_trait]
pub trait BannerRepository {
    /// Banner with its translations.
    async fn find_by_id(&self, id: i64) -> Result<Option<Banner>, error::SystemError>;

    /// One page of banners with translations eagerly loaded, plus the total count.
    async fn find_page(
        &self,
        pagination: Pagination,
        sort: &BannerSort,
    ) -> Result<(Vec<Banner>, i64), error::SystemError>;

    /// Insert or update the banner and all given translations in one transaction.
    async fn save(&self, banner: &Banner) -> Result<Banner, error::SystemError>;

    /// Delete the banner; translations go with it.
    async fn delete(&self, id: i64) -> Result<bool, error::SystemError>;
}
