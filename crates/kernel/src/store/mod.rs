//! Entity store abstraction.
//!
//! All persistence goes through [`EntityStore`]. Two backends exist:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, list queries built with SeaQuery.
//! - [`MemoryStore`]: in-process tables behind a lock, used when no database
//!   is configured and by the test suite.
//!
//! Backends enforce uniqueness of `slug`, `shareableLink`, `siteId`, `apiKey`
//! and `email` themselves and report a violation as
//! [`StoreError::UniqueViolation`] naming the wire field.

mod memory;
mod postgres;
pub mod query;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::access;
use crate::models::{Blog, Site, User};

/// Fixed page size for blog listings.
pub const PAGE_SIZE: u32 = 10;

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated on {field}")]
    UniqueViolation { field: String },

    #[error("store backend error")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn unique(field: &str) -> Self {
        Self::UniqueViolation {
            field: field.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Composable blog list filter. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilter {
    /// Case-insensitive substring matched against title, content and tags.
    pub keyword: Option<String>,
    /// `None` matches both states.
    pub published: Option<bool>,
    /// Exact category match.
    pub category: Option<String>,
    /// Restrict to posts visible to this tenant.
    pub tenant: Option<String>,
}

impl BlogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_published(mut self, published: Option<bool>) -> Self {
        self.published = published;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.is_empty());
        self
    }

    pub fn for_tenant(mut self, site_id: Option<String>) -> Self {
        self.tenant = site_id.filter(|s| !s.is_empty());
        self
    }

    /// Evaluate the filter against a single post.
    pub fn matches(&self, blog: &Blog) -> bool {
        if let Some(ref keyword) = self.keyword {
            let needle = keyword.to_lowercase();
            let hit = blog.title.to_lowercase().contains(&needle)
                || blog.content.to_lowercase().contains(&needle)
                || blog.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(published) = self.published
            && blog.published != published
        {
            return false;
        }

        if let Some(ref category) = self.category
            && &blog.category != category
        {
            return false;
        }

        if let Some(ref tenant) = self.tenant
            && !access::is_visible_to_tenant(blog, tenant)
        {
            return false;
        }

        true
    }
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
}

impl PageRequest {
    /// Page numbers below 1 are treated as 1.
    pub fn new(number: i64) -> Self {
        let number = u32::try_from(number.max(1)).unwrap_or(u32::MAX);
        Self { number }
    }

    /// Parse a raw query-string value; anything unparseable is page 1.
    pub fn parse(raw: Option<&str>) -> Self {
        Self::new(raw.and_then(|v| v.trim().parse().ok()).unwrap_or(1))
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn limit(&self) -> u64 {
        u64::from(PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.number(),
            pages: total.div_ceil(u64::from(PAGE_SIZE)),
            total,
        }
    }
}

/// Persistent storage for users, blogs and sites.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Backend name for logs and health output (e.g. "postgres", "memory").
    fn backend(&self) -> &'static str;

    /// Whether the backend is reachable.
    async fn health(&self) -> bool;

    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Display names for the given user ids. Unknown ids are left out.
    async fn user_names(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, String>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn insert_blog(&self, blog: &Blog) -> StoreResult<()>;

    /// Persist every mutable column of an existing post.
    ///
    /// `author`, `created_at` and `view_count` are never overwritten. Returns
    /// `false` when the post no longer exists.
    async fn save_blog(&self, blog: &Blog) -> StoreResult<bool>;

    async fn find_blog(&self, id: Uuid) -> StoreResult<Option<Blog>>;

    async fn find_blog_by_slug(&self, slug: &str) -> StoreResult<Option<Blog>>;

    async fn find_blog_by_shareable_link(&self, link: &str) -> StoreResult<Option<Blog>>;

    async fn delete_blog(&self, id: Uuid) -> StoreResult<bool>;

    /// One page of matching posts, newest first, plus the total match count.
    async fn query_blogs(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<Blog>, u64)>;

    /// Every post by an author, newest first.
    async fn blogs_by_author(&self, author: Uuid) -> StoreResult<Vec<Blog>>;

    /// Sorted distinct categories in use.
    async fn distinct_categories(&self) -> StoreResult<Vec<String>>;

    /// Atomically add one to a post's view count. Returns `false` if absent.
    async fn increment_view_count(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_site(&self, site: &Site) -> StoreResult<()>;

    /// Persist every mutable column of an existing site.
    async fn save_site(&self, site: &Site) -> StoreResult<bool>;

    async fn find_site(&self, id: Uuid) -> StoreResult<Option<Site>>;

    async fn find_site_by_site_id(&self, site_id: &str) -> StoreResult<Option<Site>>;

    async fn find_active_site_by_api_key(&self, api_key: &str) -> StoreResult<Option<Site>>;

    /// Sites owned by a user, newest first.
    async fn sites_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Site>>;

    async fn delete_site(&self, id: Uuid) -> StoreResult<bool>;
}
