//! Quire test utilities.
//!
//! Request payload builders for integration tests. Each builder starts from a
//! valid payload and renders the camelCase JSON body the API expects.

use serde_json::{Map, Value as JsonValue, json};

/// Create a valid blog payload with the given title.
pub fn test_blog(title: &str) -> TestBlog {
    TestBlog {
        title: title.to_string(),
        content: format!("Content of {title}"),
        excerpt: format!("Excerpt of {title}"),
        published: false,
        category: None,
        tags: Vec::new(),
        site_id: None,
        sites: Vec::new(),
        is_global: false,
    }
}

/// A blog payload builder.
#[derive(Debug, Clone)]
pub struct TestBlog {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub published: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub site_id: Option<String>,
    pub sites: Vec<String>,
    pub is_global: bool,
}

impl TestBlog {
    /// Set as published.
    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Set the owning tenant.
    pub fn for_site(mut self, site_id: &str) -> Self {
        self.site_id = Some(site_id.to_string());
        self
    }

    /// Share with additional tenants.
    pub fn shared_with(mut self, sites: &[&str]) -> Self {
        self.sites = sites.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Make visible to every tenant.
    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    /// Render the request body.
    pub fn to_json(&self) -> JsonValue {
        let mut body = Map::new();
        body.insert("title".into(), json!(self.title));
        body.insert("content".into(), json!(self.content));
        body.insert("excerpt".into(), json!(self.excerpt));
        body.insert("published".into(), json!(self.published));
        body.insert("tags".into(), json!(self.tags));
        body.insert("sites".into(), json!(self.sites));
        body.insert("isGlobal".into(), json!(self.is_global));
        if let Some(ref category) = self.category {
            body.insert("category".into(), json!(category));
        }
        if let Some(ref site_id) = self.site_id {
            body.insert("siteId".into(), json!(site_id));
        }
        JsonValue::Object(body)
    }
}

/// Create a valid site payload for the given tenant identifier.
pub fn test_site(site_id: &str) -> TestSite {
    TestSite {
        site_id: site_id.to_string(),
        name: format!("Site {site_id}"),
        domain: format!("https://{site_id}.example.com"),
        allowed_origins: Vec::new(),
    }
}

/// A site payload builder.
#[derive(Debug, Clone)]
pub struct TestSite {
    pub site_id: String,
    pub name: String,
    pub domain: String,
    pub allowed_origins: Vec<String>,
}

impl TestSite {
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }

    pub fn with_origins(mut self, origins: &[&str]) -> Self {
        self.allowed_origins = origins.iter().map(|o| (*o).to_string()).collect();
        self
    }

    /// Render the request body.
    pub fn to_json(&self) -> JsonValue {
        json!({
            "siteId": self.site_id,
            "name": self.name,
            "domain": self.domain,
            "allowedOrigins": self.allowed_origins,
        })
    }
}

/// Create a registration payload.
pub fn test_account(name: &str, email: &str, password: &str) -> JsonValue {
    json!({
        "name": name,
        "email": email,
        "password": password,
    })
}
