use std::sync::Arc;

use crate::{
    api::{error, success::Page},
    modules::banner::{
        model::{Banner, BannerSort},
        repository::BannerRepository,
    },
    utils::Pagination,
};

/// Paginated, sortable listing of banners with their translations.
#[derive(Clone)]
pub struct BannerDataProvider {
    repo: Arc<dyn BannerRepository + Send + Sync>,
    pagination: Pagination,
    sort: BannerSort,
}

impl BannerDataProvider {
    pub fn new(repo: Arc<dyn BannerRepository + Send + Sync>) -> Self {
        Self { repo, pagination: Pagination::default(), sort: BannerSort::default() }
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination.normalize();
        self
    }

    pub fn sort_by(mut self, sort: BannerSort) -> Self {
        self.sort = sort;
        self
    }

    pub async fn fetch(&self) -> Result<Page<Banner>, error::SystemError> {
        let (items, total) = self.repo.find_page(self.pagination, &self.sort).await?;
        Ok(Page { items, total, page: self.pagination.page, per_page: self.pagination.per_page })
    }
}
