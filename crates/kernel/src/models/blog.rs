//! Blog post record and request inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields::{StringOrList, double_option};

/// Featured image used when a post is created without one.
pub const DEFAULT_FEATURED_IMAGE: &str = "/images/default-blog.jpg";

/// Category assigned when a post is created without one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Blog post record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    pub title: String,

    pub content: String,

    pub excerpt: String,

    pub featured_image: String,

    /// Author user ID. Never changes after creation.
    #[sqlx(rename = "author_id")]
    pub author: Uuid,

    pub tags: Vec<String>,

    pub category: String,

    pub published: bool,

    /// Set the first time the post is published, never reset.
    pub published_at: Option<DateTime<Utc>>,

    /// Number of individual reads.
    pub view_count: i64,

    /// URL slug derived from the title; unique across all posts.
    pub slug: String,

    /// Public link generated on first publication; stable afterwards.
    pub shareable_link: Option<String>,

    /// Owning tenant, if any.
    pub site_id: Option<String>,

    /// Additional tenants the post is shared with.
    pub sites: Vec<String>,

    /// Visible to every tenant.
    pub is_global: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Author reference embedded in read responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    /// `None` when the account no longer exists.
    pub name: Option<String>,
}

/// A post with its author resolved, as returned by listings and single reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: String,
    pub author: AuthorRef,
    pub tags: Vec<String>,
    pub category: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub slug: String,
    pub shareable_link: Option<String>,
    pub site_id: Option<String>,
    pub sites: Vec<String>,
    pub is_global: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogView {
    pub fn new(blog: Blog, author_name: Option<String>) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            content: blog.content,
            excerpt: blog.excerpt,
            featured_image: blog.featured_image,
            author: AuthorRef {
                id: blog.author,
                name: author_name,
            },
            tags: blog.tags,
            category: blog.category,
            published: blog.published,
            published_at: blog.published_at,
            view_count: blog.view_count,
            slug: blog.slug,
            shareable_link: blog.shareable_link,
            site_id: blog.site_id,
            sites: blog.sites,
            is_global: blog.is_global,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

/// Input for creating a blog post.
///
/// Required fields are optional here so a missing one can be reported by name
/// instead of as a generic decoding error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlog {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Option<StringOrList>,
    pub category: Option<String>,
    pub published: Option<bool>,
    pub site_id: Option<String>,
    pub sites: Option<StringOrList>,
    pub is_global: Option<bool>,
}

/// Input for a partial blog update. Absent fields leave the post untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlog {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Option<StringOrList>,
    pub category: Option<String>,
    pub published: Option<bool>,
    /// `null` clears the owning tenant.
    #[serde(default, deserialize_with = "double_option")]
    pub site_id: Option<Option<String>>,
    pub sites: Option<StringOrList>,
    pub is_global: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_site_from_absent() {
        let cleared: UpdateBlog = serde_json::from_str(r#"{"siteId": null}"#).unwrap();
        assert_eq!(cleared.site_id, Some(None));

        let untouched: UpdateBlog = serde_json::from_str(r#"{"category": "x"}"#).unwrap();
        assert_eq!(untouched.site_id, None);
        assert_eq!(untouched.category.as_deref(), Some("x"));
    }

    #[test]
    fn create_accepts_tags_as_string_or_list() {
        let a: CreateBlog = serde_json::from_str(r#"{"tags": "a, b"}"#).unwrap();
        let b: CreateBlog = serde_json::from_str(r#"{"tags": ["a", "b"]}"#).unwrap();
        assert_eq!(a.tags.unwrap().into_list(), b.tags.unwrap().into_list());
    }

    fn sample() -> Blog {
        let now = Utc::now();
        Blog {
            id: Uuid::now_v7(),
            title: "T".into(),
            content: "C".into(),
            excerpt: "E".into(),
            featured_image: DEFAULT_FEATURED_IMAGE.into(),
            author: Uuid::now_v7(),
            tags: vec![],
            category: DEFAULT_CATEGORY.into(),
            published: false,
            published_at: None,
            view_count: 0,
            slug: "t".into(),
            shareable_link: None,
            site_id: None,
            sites: vec![],
            is_global: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("featuredImage").is_some());
        assert!(json.get("viewCount").is_some());
        assert!(json.get("isGlobal").is_some());
        assert!(json.get("shareableLink").is_some());
        assert!(json.get("featured_image").is_none());
    }

    #[test]
    fn view_embeds_author_reference() {
        let blog = sample();
        let author = blog.author;

        let json = serde_json::to_value(BlogView::new(blog, Some("Ada".into()))).unwrap();
        assert_eq!(json["author"]["id"], author.to_string());
        assert_eq!(json["author"]["name"], "Ada");
        assert!(json.get("viewCount").is_some());

        let orphan = serde_json::to_value(BlogView::new(sample(), None)).unwrap();
        assert!(orphan["author"]["name"].is_null());
    }
}
