//! Blog post service.
//!
//! Creation, partial updates, lookups that count views, and filtered listings.
//! Every write is preceded by validation and the ownership check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::parse_id;
use super::slug::{shareable_link, slugify};
use crate::access::{RequestContext, ensure_can_modify};
use crate::error::{AppError, AppResult};
use crate::models::blog::{DEFAULT_CATEGORY, DEFAULT_FEATURED_IMAGE};
use crate::models::fields::non_blank;
use crate::models::{Blog, BlogView, CreateBlog, UpdateBlog};
use crate::store::{BlogFilter, EntityStore, Page, PageRequest};

const NOT_FOUND: &str = "Blog not found";

/// Blog post operations over an entity store.
#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn EntityStore>,
}

impl BlogService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// One page of posts matching `filter`, newest first.
    pub async fn list(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> AppResult<Page<BlogView>> {
        let (items, total) = self.store.query_blogs(filter, page).await?;
        Ok(Page::new(self.with_authors(items).await?, page, total))
    }

    /// Published posts visible to tenant `site_id`.
    pub async fn list_for_site(
        &self,
        site_id: &str,
        filter: BlogFilter,
        page: PageRequest,
    ) -> AppResult<Page<BlogView>> {
        let filter = filter.for_tenant(Some(site_id.to_string()));
        self.list(&filter, page).await
    }

    /// Tenant feed for an API-key caller. The key's site must be `site_id`.
    pub async fn list_for_api_site(
        &self,
        ctx: &RequestContext,
        site_id: &str,
        filter: BlogFilter,
        page: PageRequest,
    ) -> AppResult<Page<BlogView>> {
        match ctx.site() {
            Some(site) if site.site_id == site_id => {}
            _ => {
                return Err(AppError::Unauthorized(
                    "Not authorized to access this site".to_string(),
                ));
            }
        }
        self.list_for_site(site_id, filter, page).await
    }

    pub async fn get_by_id(&self, raw_id: &str) -> AppResult<BlogView> {
        let Some(id) = parse_id(raw_id) else {
            return Err(not_found());
        };
        let blog = self.store.find_blog(id).await?.ok_or_else(not_found)?;
        self.with_author(self.record_view(blog).await).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<BlogView> {
        let blog = self
            .store
            .find_blog_by_slug(slug)
            .await?
            .ok_or_else(not_found)?;
        self.with_author(self.record_view(blog).await).await
    }

    pub async fn get_by_shareable_link(&self, link: &str) -> AppResult<BlogView> {
        let blog = self
            .store
            .find_blog_by_shareable_link(link)
            .await?
            .ok_or_else(not_found)?;
        self.with_author(self.record_view(blog).await).await
    }

    /// Count a read. Failures are logged and the read still succeeds.
    async fn record_view(&self, mut blog: Blog) -> Blog {
        match self.store.increment_view_count(blog.id).await {
            Ok(true) => blog.view_count += 1,
            Ok(false) => warn!(blog_id = %blog.id, "post vanished before its view was counted"),
            Err(e) => warn!(blog_id = %blog.id, error = %e, "failed to increment view count"),
        }
        blog
    }

    pub async fn create(&self, ctx: &RequestContext, input: CreateBlog) -> AppResult<Blog> {
        let user = ctx.require_user()?;
        let blog = build_blog(input, user.id, Utc::now())?;

        self.store.insert_blog(&blog).await?;

        info!(blog_id = %blog.id, author = %user.id, slug = %blog.slug, "blog created");
        Ok(blog)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        raw_id: &str,
        input: UpdateBlog,
    ) -> AppResult<Blog> {
        let mut blog = self.find(raw_id).await?;
        ensure_can_modify(ctx, blog.author, "edit this blog")?;

        apply_update(&mut blog, input, Utc::now())?;

        if !self.store.save_blog(&blog).await? {
            return Err(not_found());
        }

        info!(blog_id = %blog.id, "blog updated");
        Ok(blog)
    }

    pub async fn delete(&self, ctx: &RequestContext, raw_id: &str) -> AppResult<()> {
        let blog = self.find(raw_id).await?;
        ensure_can_modify(ctx, blog.author, "delete this blog")?;

        if !self.store.delete_blog(blog.id).await? {
            return Err(not_found());
        }

        info!(blog_id = %blog.id, "blog deleted");
        Ok(())
    }

    /// Every post by the caller, newest first, in any state.
    pub async fn list_by_author(&self, ctx: &RequestContext) -> AppResult<Vec<Blog>> {
        let user = ctx.require_user()?;
        Ok(self.store.blogs_by_author(user.id).await?)
    }

    pub async fn distinct_categories(&self) -> AppResult<Vec<String>> {
        Ok(self.store.distinct_categories().await?)
    }

    async fn with_author(&self, blog: Blog) -> AppResult<BlogView> {
        let mut names = self.store.user_names(&[blog.author]).await?;
        let name = names.remove(&blog.author);
        Ok(BlogView::new(blog, name))
    }

    /// Resolve author names for a batch of posts with one lookup.
    async fn with_authors(&self, blogs: Vec<Blog>) -> AppResult<Vec<BlogView>> {
        let mut ids: Vec<Uuid> = blogs.iter().map(|b| b.author).collect();
        ids.sort_unstable();
        ids.dedup();

        let names = self.store.user_names(&ids).await?;
        Ok(blogs
            .into_iter()
            .map(|blog| {
                let name = names.get(&blog.author).cloned();
                BlogView::new(blog, name)
            })
            .collect())
    }

    /// Load without counting a view.
    async fn find(&self, raw_id: &str) -> AppResult<Blog> {
        let Some(id) = parse_id(raw_id) else {
            return Err(not_found());
        };
        self.store.find_blog(id).await?.ok_or_else(not_found)
    }
}

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.to_string())
}

fn slug_for(title: &str) -> AppResult<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(AppError::ValidationFailed {
            field: "title",
            message: "title must contain at least one letter or digit".to_string(),
        });
    }
    Ok(slug)
}

/// Build a new post from create input.
pub fn build_blog(input: CreateBlog, author: Uuid, now: DateTime<Utc>) -> AppResult<Blog> {
    let title = non_blank(input.title).ok_or_else(|| AppError::missing("title"))?;
    let content = non_blank(input.content).ok_or_else(|| AppError::missing("content"))?;
    let excerpt = non_blank(input.excerpt).ok_or_else(|| AppError::missing("excerpt"))?;
    let slug = slug_for(&title)?;

    let published = input.published.unwrap_or(false);
    let shareable_link = published.then(|| shareable_link(&slug, now));

    Ok(Blog {
        id: Uuid::now_v7(),
        title,
        content,
        excerpt,
        featured_image: non_blank(input.featured_image)
            .unwrap_or_else(|| DEFAULT_FEATURED_IMAGE.to_string()),
        author,
        tags: input.tags.map(|t| t.into_list()).unwrap_or_default(),
        category: non_blank(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        published,
        published_at: published.then_some(now),
        view_count: 0,
        slug,
        shareable_link,
        site_id: non_blank(input.site_id),
        sites: input.sites.map(|s| s.into_list()).unwrap_or_default(),
        is_global: input.is_global.unwrap_or(false),
        created_at: now,
        updated_at: now,
    })
}

/// Apply a partial update in place.
///
/// Blank strings count as absent. `published`, `siteId` and `isGlobal` apply
/// whenever present, including falsy values.
pub fn apply_update(blog: &mut Blog, input: UpdateBlog, now: DateTime<Utc>) -> AppResult<()> {
    if let Some(title) = non_blank(input.title) {
        blog.slug = slug_for(&title)?;
        blog.title = title;
    }
    if let Some(content) = non_blank(input.content) {
        blog.content = content;
    }
    if let Some(excerpt) = non_blank(input.excerpt) {
        blog.excerpt = excerpt;
    }
    if let Some(image) = non_blank(input.featured_image) {
        blog.featured_image = image;
    }
    if let Some(category) = non_blank(input.category) {
        blog.category = category;
    }
    if let Some(tags) = input.tags {
        blog.tags = tags.into_list();
    }
    if let Some(sites) = input.sites {
        blog.sites = sites.into_list();
    }
    if let Some(site_id) = input.site_id {
        blog.site_id = non_blank(site_id);
    }
    if let Some(is_global) = input.is_global {
        blog.is_global = is_global;
    }

    if let Some(published) = input.published {
        blog.published = published;
        if published {
            if blog.published_at.is_none() {
                blog.published_at = Some(now);
            }
            if blog.shareable_link.is_none() {
                blog.shareable_link = Some(shareable_link(&blog.slug, now));
            }
        }
    }

    blog.updated_at = now;
    Ok(())
}
