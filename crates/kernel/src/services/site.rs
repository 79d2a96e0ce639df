//! Tenant site service and API-key lifecycle.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::parse_id;
use crate::access::{RequestContext, ensure_can_modify};
use crate::error::{AppError, AppResult};
use crate::models::fields::non_blank;
use crate::models::{CreateSite, Site, UpdateSite};
use crate::store::{EntityStore, StoreError};

/// Generate a 32-byte random hex API key.
pub fn generate_api_key() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Append `domain` to `origins` unless already present.
fn ensure_domain(origins: &mut Vec<String>, domain: &str) {
    if !origins.iter().any(|o| o == domain) {
        origins.push(domain.to_string());
    }
}

/// Site operations over an entity store.
#[derive(Clone)]
pub struct SiteService {
    store: Arc<dyn EntityStore>,
}

impl SiteService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, ctx: &RequestContext, input: CreateSite) -> AppResult<Site> {
        let user = ctx.require_user()?;

        let name = non_blank(input.name).ok_or_else(|| AppError::missing("name"))?;
        let domain = non_blank(input.domain).ok_or_else(|| AppError::missing("domain"))?;
        let site_id = non_blank(input.site_id).ok_or_else(|| AppError::missing("siteId"))?;

        if self.store.find_site_by_site_id(&site_id).await?.is_some() {
            return Err(StoreError::unique("siteId").into());
        }

        let mut allowed_origins = input
            .allowed_origins
            .map(|o| o.into_list())
            .unwrap_or_default();
        ensure_domain(&mut allowed_origins, &domain);

        let now = Utc::now();
        let site = Site {
            id: Uuid::now_v7(),
            site_id,
            name,
            domain,
            description: non_blank(input.description),
            api_key: generate_api_key(),
            is_active: true,
            owner: user.id,
            allowed_origins,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_site(&site).await?;

        info!(site_id = %site.site_id, owner = %user.id, "site created");
        Ok(site)
    }

    pub async fn get(&self, ctx: &RequestContext, raw_id: &str) -> AppResult<Site> {
        let site = self.find(raw_id).await?;
        ensure_can_modify(ctx, site.owner, "view this site")?;
        Ok(site)
    }

    /// Sites owned by the caller, newest first.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Site>> {
        let user = ctx.require_user()?;
        Ok(self.store.sites_by_owner(user.id).await?)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        raw_id: &str,
        input: UpdateSite,
    ) -> AppResult<Site> {
        let mut site = self.find(raw_id).await?;
        ensure_can_modify(ctx, site.owner, "update this site")?;

        if let Some(name) = non_blank(input.name) {
            site.name = name;
        }
        if let Some(domain) = non_blank(input.domain) {
            site.domain = domain;
        }
        if let Some(description) = input.description {
            site.description = non_blank(description);
        }
        if let Some(is_active) = input.is_active {
            site.is_active = is_active;
        }
        if let Some(origins) = input.allowed_origins {
            site.allowed_origins = origins.into_list();
        }
        let domain = site.domain.clone();
        ensure_domain(&mut site.allowed_origins, &domain);
        site.updated_at = Utc::now();

        self.save(&site).await?;

        info!(site_id = %site.site_id, "site updated");
        Ok(site)
    }

    pub async fn delete(&self, ctx: &RequestContext, raw_id: &str) -> AppResult<()> {
        let site = self.find(raw_id).await?;
        ensure_can_modify(ctx, site.owner, "delete this site")?;

        if !self.store.delete_site(site.id).await? {
            return Err(not_found());
        }

        info!(site_id = %site.site_id, "site deleted");
        Ok(())
    }

    /// Replace the site's API key. The old key stops working immediately.
    pub async fn regenerate_api_key(
        &self,
        ctx: &RequestContext,
        raw_id: &str,
    ) -> AppResult<String> {
        let mut site = self.find(raw_id).await?;
        ensure_can_modify(ctx, site.owner, "update this site")?;

        site.api_key = generate_api_key();
        site.updated_at = Utc::now();
        self.save(&site).await?;

        info!(site_id = %site.site_id, "API key regenerated");
        Ok(site.api_key)
    }

    async fn find(&self, raw_id: &str) -> AppResult<Site> {
        let Some(id) = parse_id(raw_id) else {
            return Err(not_found());
        };
        self.store.find_site(id).await?.ok_or_else(not_found)
    }

    async fn save(&self, site: &Site) -> AppResult<()> {
        if self.store.save_site(site).await? {
            Ok(())
        } else {
            Err(not_found())
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Site not found".to_string())
}
