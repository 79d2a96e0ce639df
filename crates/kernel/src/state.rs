//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::services::{
    AccountService, BlogService, CredentialValidator, SessionTokens, SiteService,
};
use crate::store::{EntityStore, MemoryStore, PgStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Entity store backend.
    store: Arc<dyn EntityStore>,

    /// Session and API-key credential checks.
    credentials: CredentialValidator,

    /// Blog service.
    blogs: BlogService,

    /// Site service.
    sites: SiteService,

    /// Account service.
    accounts: AccountService,
}

impl AppState {
    /// Create application state, connecting to PostgreSQL when configured.
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn EntityStore> = match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections)
                    .await
                    .context("failed to create database pool")?;
                info!("connected to PostgreSQL");
                Arc::new(PgStore::new(pool))
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store, data will not persist");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Create application state over an existing store.
    pub fn with_store(config: &Config, store: Arc<dyn EntityStore>) -> Self {
        let tokens = SessionTokens::new(
            config.jwt_secret.as_bytes(),
            config.session_token_ttl_days,
        );

        let inner = AppStateInner {
            credentials: CredentialValidator::new(store.clone(), tokens.clone()),
            blogs: BlogService::new(store.clone()),
            sites: SiteService::new(store.clone()),
            accounts: AccountService::new(store.clone(), tokens),
            store,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Get the entity store.
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.inner.store
    }

    /// Get the credential validator.
    pub fn credentials(&self) -> &CredentialValidator {
        &self.inner.credentials
    }

    /// Get the blog service.
    pub fn blogs(&self) -> &BlogService {
        &self.inner.blogs
    }

    /// Get the site service.
    pub fn sites(&self) -> &SiteService {
        &self.inner.sites
    }

    /// Get the account service.
    pub fn accounts(&self) -> &AccountService {
        &self.inner.accounts
    }

    /// Check whether the store backend is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.inner.store.health().await
    }
}
