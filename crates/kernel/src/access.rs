//! Request identity and access policy.
//!
//! The credential middleware attaches either an [`AuthUser`] or a [`Site`] to
//! the request extensions. [`RequestContext`] turns whatever is there into an
//! explicit value that handlers pass to every service call.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::Extensions;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{AuthUser, Blog, Site};

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestContext {
    #[default]
    Anonymous,
    /// Authenticated with a session token.
    User(AuthUser),
    /// Authenticated with a site API key.
    Site(Site),
}

impl RequestContext {
    /// Build the context from request extensions. A user wins over a site.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        if let Some(user) = extensions.get::<AuthUser>() {
            return Self::User(user.clone());
        }
        if let Some(site) = extensions.get::<Site>() {
            return Self::Site(site.clone());
        }
        Self::Anonymous
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn site(&self) -> Option<&Site> {
        match self {
            Self::Site(site) => Some(site),
            _ => None,
        }
    }

    /// The calling user, or `Unauthenticated`.
    pub fn require_user(&self) -> AppResult<&AuthUser> {
        self.user()
            .ok_or_else(|| AppError::Unauthenticated("Not authorized, no token".to_string()))
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions))
    }
}

/// Whether the caller may mutate an entity owned by `owner`.
///
/// Only the owner and administrators qualify. Anonymous callers and API-key
/// sites never do.
pub fn can_modify(ctx: &RequestContext, owner: Uuid) -> bool {
    match ctx {
        RequestContext::User(user) => user.is_admin || user.id == owner,
        RequestContext::Anonymous | RequestContext::Site(_) => false,
    }
}

/// Reject with `Unauthorized` unless [`can_modify`] holds.
pub fn ensure_can_modify(ctx: &RequestContext, owner: Uuid, action: &str) -> AppResult<()> {
    if can_modify(ctx, owner) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!("Not authorized to {action}")))
    }
}

/// Whether a post shows up in tenant `site_id`'s feed.
pub fn is_visible_to_tenant(blog: &Blog, site_id: &str) -> bool {
    blog.published
        && (blog.site_id.as_deref() == Some(site_id)
            || blog.sites.iter().any(|s| s == site_id)
            || blog.is_global)
}

/// Check a request origin against a site's allow-list.
///
/// An empty list allows everything. Entries are exact origins, or `*.suffix`
/// which admits any origin ending in `suffix`.
pub fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }

    allowed.iter().any(|entry| match entry.strip_prefix("*.") {
        Some(suffix) => origin.ends_with(suffix),
        None => entry == origin,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::Request;
    use chrono::Utc;

    use super::*;

    fn user(is_admin: bool) -> AuthUser {
        AuthUser {
            id: Uuid::now_v7(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            is_admin,
        }
    }

    fn site() -> Site {
        let now = Utc::now();
        Site {
            id: Uuid::now_v7(),
            site_id: "tenant-a".to_string(),
            name: "Tenant A".to_string(),
            domain: "https://a.example.com".to_string(),
            description: None,
            api_key: "k".repeat(64),
            is_active: true,
            owner: Uuid::now_v7(),
            allowed_origins: vec!["https://a.example.com".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    fn blog(published: bool, site_id: Option<&str>, sites: &[&str], is_global: bool) -> Blog {
        let now = Utc::now();
        Blog {
            id: Uuid::now_v7(),
            title: "T".to_string(),
            content: "C".to_string(),
            excerpt: "E".to_string(),
            featured_image: String::new(),
            author: Uuid::now_v7(),
            tags: vec![],
            category: "Uncategorized".to_string(),
            published,
            published_at: None,
            view_count: 0,
            slug: "t".to_string(),
            shareable_link: None,
            site_id: site_id.map(str::to_string),
            sites: sites.iter().map(|s| s.to_string()).collect(),
            is_global,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_and_admin_may_modify() {
        let owner = user(false);
        let ctx = RequestContext::User(owner.clone());
        assert!(can_modify(&ctx, owner.id));
        assert!(!can_modify(&ctx, Uuid::now_v7()));

        let admin = RequestContext::User(user(true));
        assert!(can_modify(&admin, Uuid::now_v7()));
    }

    #[test]
    fn anonymous_and_sites_may_not_modify() {
        let owner = Uuid::now_v7();
        assert!(!can_modify(&RequestContext::Anonymous, owner));

        let mut s = site();
        s.owner = owner;
        assert!(!can_modify(&RequestContext::Site(s), owner));

        let err = ensure_can_modify(&RequestContext::Anonymous, owner, "edit this blog");
        assert!(matches!(err, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn require_user_rejects_other_identities() {
        assert!(matches!(
            RequestContext::Anonymous.require_user(),
            Err(AppError::Unauthenticated(_))
        ));
        assert!(RequestContext::Site(site()).require_user().is_err());
        assert!(RequestContext::User(user(false)).require_user().is_ok());
    }

    #[test]
    fn context_is_read_from_extensions() {
        let mut request = Request::new(());
        assert_eq!(
            RequestContext::from_extensions(request.extensions()),
            RequestContext::Anonymous
        );

        let s = site();
        request.extensions_mut().insert(s.clone());
        assert_eq!(
            RequestContext::from_extensions(request.extensions()),
            RequestContext::Site(s)
        );

        let u = user(false);
        request.extensions_mut().insert(u.clone());
        assert_eq!(
            RequestContext::from_extensions(request.extensions()),
            RequestContext::User(u)
        );
    }

    #[test]
    fn unpublished_posts_are_never_tenant_visible() {
        assert!(!is_visible_to_tenant(&blog(false, Some("a"), &[], true), "a"));
    }

    #[test]
    fn tenant_visibility_by_owner_share_or_global() {
        assert!(is_visible_to_tenant(&blog(true, Some("a"), &[], false), "a"));
        assert!(is_visible_to_tenant(&blog(true, Some("b"), &["a"], false), "a"));
        assert!(is_visible_to_tenant(&blog(true, None, &[], true), "a"));
        assert!(!is_visible_to_tenant(&blog(true, Some("b"), &["c"], false), "a"));
        assert!(!is_visible_to_tenant(&blog(true, None, &[], false), "a"));
    }

    #[test]
    fn exact_origin_match() {
        let allowed = vec!["https://a.example.com".to_string()];
        assert!(origin_allowed(&allowed, "https://a.example.com"));
        assert!(!origin_allowed(&allowed, "https://b.example.com"));
    }

    #[test]
    fn wildcard_origin_matches_suffix() {
        let allowed = vec!["*.example.com".to_string()];
        assert!(origin_allowed(&allowed, "https://blog.example.com"));
        assert!(origin_allowed(&allowed, "https://example.com"));
        assert!(!origin_allowed(&allowed, "https://example.org"));
    }

    #[test]
    fn empty_allow_list_admits_any_origin() {
        assert!(origin_allowed(&[], "https://anything.test"));
    }
}
