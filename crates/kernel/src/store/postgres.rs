//! PostgreSQL entity store.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::query::BlogQueryBuilder;
use super::{BlogFilter, EntityStore, PageRequest, StoreError, StoreResult};
use crate::db;
use crate::models::{Blog, Site, User};

/// Entity store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique constraint name to the wire field it protects.
fn field_for_constraint(constraint: &str) -> &'static str {
    match constraint {
        "blogs_slug_key" => "slug",
        "blogs_shareable_link_key" => "shareableLink",
        "sites_site_id_key" => "siteId",
        "sites_api_key_key" => "apiKey",
        "users_email_key" => "email",
        _ => "unknown",
    }
}

/// Translate a sqlx error, surfacing unique violations by field.
fn translate(err: sqlx::Error, context: &'static str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let field = db_err.constraint().map_or("unknown", field_for_constraint);
        return StoreError::unique(field);
    }
    StoreError::Backend(anyhow::Error::new(err).context(context))
}

#[async_trait]
impl EntityStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health(&self) -> bool {
        db::check_health(&self.pool).await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_admin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, "failed to create user"))?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch user by id"))
    }

    async fn user_names(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| translate(e, "failed to fetch author names"))?;
        Ok(rows.into_iter().collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch user by email"))
    }

    async fn insert_blog(&self, blog: &Blog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blogs (
                id, title, content, excerpt, featured_image, author_id, tags, category,
                published, published_at, view_count, slug, shareable_link, site_id, sites,
                is_global, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(blog.id)
        .bind(&blog.title)
        .bind(&blog.content)
        .bind(&blog.excerpt)
        .bind(&blog.featured_image)
        .bind(blog.author)
        .bind(&blog.tags)
        .bind(&blog.category)
        .bind(blog.published)
        .bind(blog.published_at)
        .bind(blog.view_count)
        .bind(&blog.slug)
        .bind(&blog.shareable_link)
        .bind(&blog.site_id)
        .bind(&blog.sites)
        .bind(blog.is_global)
        .bind(blog.created_at)
        .bind(blog.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, "failed to create blog"))?;

        Ok(())
    }

    async fn save_blog(&self, blog: &Blog) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE blogs SET
                title = $2, content = $3, excerpt = $4, featured_image = $5, tags = $6,
                category = $7, published = $8, published_at = $9, slug = $10,
                shareable_link = $11, site_id = $12, sites = $13, is_global = $14,
                updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(blog.id)
        .bind(&blog.title)
        .bind(&blog.content)
        .bind(&blog.excerpt)
        .bind(&blog.featured_image)
        .bind(&blog.tags)
        .bind(&blog.category)
        .bind(blog.published)
        .bind(blog.published_at)
        .bind(&blog.slug)
        .bind(&blog.shareable_link)
        .bind(&blog.site_id)
        .bind(&blog.sites)
        .bind(blog.is_global)
        .bind(blog.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, "failed to update blog"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_blog(&self, id: Uuid) -> StoreResult<Option<Blog>> {
        sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch blog by id"))
    }

    async fn find_blog_by_slug(&self, slug: &str) -> StoreResult<Option<Blog>> {
        sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch blog by slug"))
    }

    async fn find_blog_by_shareable_link(&self, link: &str) -> StoreResult<Option<Blog>> {
        sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE shareable_link = $1")
            .bind(link)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch blog by shareable link"))
    }

    async fn delete_blog(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to delete blog"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_blogs(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<Blog>, u64)> {
        let builder = BlogQueryBuilder::new(filter);

        let total: i64 = sqlx::query_scalar(&builder.build_count())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to count blogs"))?;

        let items = sqlx::query_as::<_, Blog>(&builder.build(page))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to list blogs"))?;

        let total = u64::try_from(total)
            .context("negative blog count")
            .map_err(StoreError::Backend)?;

        Ok((items, total))
    }

    async fn blogs_by_author(&self, author: Uuid) -> StoreResult<Vec<Blog>> {
        sqlx::query_as::<_, Blog>(
            "SELECT * FROM blogs WHERE author_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| translate(e, "failed to list blogs by author"))
    }

    async fn distinct_categories(&self) -> StoreResult<Vec<String>> {
        sqlx::query_scalar("SELECT DISTINCT category FROM blogs ORDER BY category")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to list categories"))
    }

    async fn increment_view_count(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE blogs SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to increment view count"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_site(&self, site: &Site) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sites (
                id, site_id, name, domain, description, api_key, is_active, owner_id,
                allowed_origins, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(site.id)
        .bind(&site.site_id)
        .bind(&site.name)
        .bind(&site.domain)
        .bind(&site.description)
        .bind(&site.api_key)
        .bind(site.is_active)
        .bind(site.owner)
        .bind(&site.allowed_origins)
        .bind(site.created_at)
        .bind(site.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, "failed to create site"))?;

        Ok(())
    }

    async fn save_site(&self, site: &Site) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sites SET
                name = $2, domain = $3, description = $4, api_key = $5, is_active = $6,
                allowed_origins = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(site.id)
        .bind(&site.name)
        .bind(&site.domain)
        .bind(&site.description)
        .bind(&site.api_key)
        .bind(site.is_active)
        .bind(&site.allowed_origins)
        .bind(site.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| translate(e, "failed to update site"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_site(&self, id: Uuid) -> StoreResult<Option<Site>> {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch site by id"))
    }

    async fn find_site_by_site_id(&self, site_id: &str) -> StoreResult<Option<Site>> {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE site_id = $1")
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch site by site id"))
    }

    async fn find_active_site_by_api_key(&self, api_key: &str) -> StoreResult<Option<Site>> {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE api_key = $1 AND is_active")
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to fetch site by api key"))
    }

    async fn sites_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Site>> {
        sqlx::query_as::<_, Site>(
            "SELECT * FROM sites WHERE owner_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| translate(e, "failed to list sites by owner"))
    }

    async fn delete_site(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| translate(e, "failed to delete site"))?;

        Ok(result.rows_affected() > 0)
    }
}
