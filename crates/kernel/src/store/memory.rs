//! In-process entity store.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{BlogFilter, EntityStore, PageRequest, StoreError, StoreResult};
use crate::models::{Blog, Site, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    blogs: HashMap<Uuid, Blog>,
    sites: HashMap<Uuid, Site>,
}

impl Tables {
    fn check_blog_unique(&self, blog: &Blog) -> StoreResult<()> {
        for other in self.blogs.values().filter(|b| b.id != blog.id) {
            if other.slug == blog.slug {
                return Err(StoreError::unique("slug"));
            }
            if blog.shareable_link.is_some() && other.shareable_link == blog.shareable_link {
                return Err(StoreError::unique("shareableLink"));
            }
        }
        Ok(())
    }

    fn check_site_unique(&self, site: &Site) -> StoreResult<()> {
        for other in self.sites.values().filter(|s| s.id != site.id) {
            if other.site_id == site.site_id {
                return Err(StoreError::unique("siteId"));
            }
            if other.api_key == site.api_key {
                return Err(StoreError::unique("apiKey"));
            }
        }
        Ok(())
    }
}

/// Entity store kept entirely in memory.
///
/// Every write takes the table lock, so uniqueness checks and view-count
/// increments are atomic with respect to each other.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    fail_view_counts: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every view-count increment fail.
    #[cfg(test)]
    pub(crate) fn fail_view_counts(&self, fail: bool) {
        self.fail_view_counts
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(test)]
    fn view_counts_failing(&self) -> bool {
        self.fail_view_counts
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn view_counts_failing(&self) -> bool {
        false
    }
}

fn newest_first_blogs(blogs: &mut [Blog]) {
    blogs.sort_by_key(|b| Reverse((b.created_at, b.id)));
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health(&self) -> bool {
        true
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::unique("email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn user_names(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, String>> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|u| (*id, u.name.clone())))
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_blog(&self, blog: &Blog) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.check_blog_unique(blog)?;
        tables.blogs.insert(blog.id, blog.clone());
        Ok(())
    }

    async fn save_blog(&self, blog: &Blog) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let Some(existing) = tables.blogs.get(&blog.id) else {
            return Ok(false);
        };
        let (author, created_at, view_count) =
            (existing.author, existing.created_at, existing.view_count);

        tables.check_blog_unique(blog)?;

        let mut stored = blog.clone();
        stored.author = author;
        stored.created_at = created_at;
        stored.view_count = view_count;
        tables.blogs.insert(stored.id, stored);
        Ok(true)
    }

    async fn find_blog(&self, id: Uuid) -> StoreResult<Option<Blog>> {
        Ok(self.tables.read().blogs.get(&id).cloned())
    }

    async fn find_blog_by_slug(&self, slug: &str) -> StoreResult<Option<Blog>> {
        Ok(self
            .tables
            .read()
            .blogs
            .values()
            .find(|b| b.slug == slug)
            .cloned())
    }

    async fn find_blog_by_shareable_link(&self, link: &str) -> StoreResult<Option<Blog>> {
        Ok(self
            .tables
            .read()
            .blogs
            .values()
            .find(|b| b.shareable_link.as_deref() == Some(link))
            .cloned())
    }

    async fn delete_blog(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().blogs.remove(&id).is_some())
    }

    async fn query_blogs(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<Blog>, u64)> {
        let mut matching: Vec<Blog> = self
            .tables
            .read()
            .blogs
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        newest_first_blogs(&mut matching);

        let total = matching.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = matching.into_iter().skip(offset).take(limit).collect();

        Ok((items, total))
    }

    async fn blogs_by_author(&self, author: Uuid) -> StoreResult<Vec<Blog>> {
        let mut blogs: Vec<Blog> = self
            .tables
            .read()
            .blogs
            .values()
            .filter(|b| b.author == author)
            .cloned()
            .collect();
        newest_first_blogs(&mut blogs);
        Ok(blogs)
    }

    async fn distinct_categories(&self) -> StoreResult<Vec<String>> {
        let categories: BTreeSet<String> = self
            .tables
            .read()
            .blogs
            .values()
            .map(|b| b.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn increment_view_count(&self, id: Uuid) -> StoreResult<bool> {
        if self.view_counts_failing() {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "view count update rejected"
            )));
        }

        let mut tables = self.tables.write();
        match tables.blogs.get_mut(&id) {
            Some(blog) => {
                blog.view_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_site(&self, site: &Site) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.check_site_unique(site)?;
        tables.sites.insert(site.id, site.clone());
        Ok(())
    }

    async fn save_site(&self, site: &Site) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let Some(existing) = tables.sites.get(&site.id) else {
            return Ok(false);
        };
        let (owner, site_id, created_at) =
            (existing.owner, existing.site_id.clone(), existing.created_at);

        tables.check_site_unique(site)?;

        let mut stored = site.clone();
        stored.owner = owner;
        stored.site_id = site_id;
        stored.created_at = created_at;
        tables.sites.insert(stored.id, stored);
        Ok(true)
    }

    async fn find_site(&self, id: Uuid) -> StoreResult<Option<Site>> {
        Ok(self.tables.read().sites.get(&id).cloned())
    }

    async fn find_site_by_site_id(&self, site_id: &str) -> StoreResult<Option<Site>> {
        Ok(self
            .tables
            .read()
            .sites
            .values()
            .find(|s| s.site_id == site_id)
            .cloned())
    }

    async fn find_active_site_by_api_key(&self, api_key: &str) -> StoreResult<Option<Site>> {
        Ok(self
            .tables
            .read()
            .sites
            .values()
            .find(|s| s.is_active && s.api_key == api_key)
            .cloned())
    }

    async fn sites_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Site>> {
        let mut sites: Vec<Site> = self
            .tables
            .read()
            .sites
            .values()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        sites.sort_by_key(|s| Reverse((s.created_at, s.id)));
        Ok(sites)
    }

    async fn delete_site(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().sites.remove(&id).is_some())
    }
}
