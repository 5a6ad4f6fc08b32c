use std::collections::HashMap;

use crate::{
    api::error,
    modules::banner::{
        model::{Banner, BannerSort},
        repository::BannerRepository,
        schema::{BannerEntity, BannerTranslationEntity},
    },
    utils::Pagination,
};

#[derive(Clone)]
pub struct BannerRepositoryPg {
    pool: sqlx::PgPool,
}

impl BannerRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn find_translations(
        &self,
        banner_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<BannerTranslationEntity>>, error::SystemError> {
        let rows = sqlx::query_as::<_, BannerTranslationEntity>(
            r#"
            SELECT banner_id, language, title, content, link, file_name
            FROM banner_translation
            WHERE banner_id = ANY($1)
            ORDER BY banner_id, language
            "#,
        )
        .bind(banner_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<BannerTranslationEntity>> = HashMap::new();
        for row in rows {
            grouped.entry(row.banner_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

#[async_trait::async_trait]
impl BannerRepository for BannerRepositoryPg {
    async fn find_by_id(&self, id: i64) -> Result<Option<Banner>, error::SystemError> {
        let Some(entity) =
            sqlx::query_as::<_, BannerEntity>("SELECT * FROM banner WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        let mut translations = self.find_translations(&[id]).await?;
        Ok(Some(Banner::from_entities(entity, translations.remove(&id).unwrap_or_default())))
    }

    async fn find_page(
        &self,
        pagination: Pagination,
        sort: &BannerSort,
    ) -> Result<(Vec<Banner>, i64), error::SystemError> {
        // ORDER BY is built from a closed set of column names.
        let sql = format!("SELECT * FROM banner ORDER BY {} LIMIT $1 OFFSET $2", sort.to_sql());

        let (entities, total) = tokio::try_join!(
            async {
                sqlx::query_as::<_, BannerEntity>(&sql)
                    .bind(pagination.limit())
                    .bind(pagination.offset())
                    .fetch_all(&self.pool)
                    .await
            },
            async {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM banner")
                    .fetch_one(&self.pool)
                    .await
            },
        )?;

        let ids: Vec<i64> = entities.iter().map(|e| e.id).collect();
        let mut translations = self.find_translations(&ids).await?;

        let banners = entities
            .into_iter()
            .map(|entity| {
                let rows = translations.remove(&entity.id).unwrap_or_default();
                Banner::from_entities(entity, rows)
            })
            .collect();

        Ok((banners, total))
    }

    async fn save(&self, banner: &Banner) -> Result<Banner, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let entity = match banner.id {
            None => {
                sqlx::query_as::<_, BannerEntity>(
                    r#"
                    INSERT INTO banner (name, is_active, position, link_target)
                    VALUES ($1, $2, $3, $4)
                    RETURNING *
                    "#,
                )
                .bind(&banner.name)
                .bind(banner.is_active)
                .bind(banner.position)
                .bind(banner.link_target)
                .fetch_one(&mut *tx)
                .await?
            }
            Some(id) => sqlx::query_as::<_, BannerEntity>(
                r#"
                UPDATE banner
                SET
                    name        = $2,
                    is_active   = $3,
                    position    = $4,
                    link_target = $5,
                    updated_at  = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&banner.name)
            .bind(banner.is_active)
            .bind(banner.position)
            .bind(banner.link_target)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Banner not found"))?,
        };

        let mut rows = Vec::with_capacity(banner.translations.len());
        for translation in &banner.translations {
            let row = sqlx::query_as::<_, BannerTranslationEntity>(
                r#"
                INSERT INTO banner_translation (banner_id, language, title, content, link, file_name)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (banner_id, language) DO UPDATE
                SET
                    title     = EXCLUDED.title,
                    content   = EXCLUDED.content,
                    link      = EXCLUDED.link,
                    file_name = EXCLUDED.file_name
                RETURNING banner_id, language, title, content, link, file_name
                "#,
            )
            .bind(entity.id)
            .bind(&translation.language)
            .bind(&translation.title)
            .bind(&translation.content)
            .bind(&translation.link)
            .bind(&translation.file_name)
            .fetch_one(&mut *tx)
            .await?;
            rows.push(row);
        }

        tx.commit().await?;

        Ok(Banner::from_entities(entity, rows))
    }

    async fn delete(&self, id: i64) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM banner WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
