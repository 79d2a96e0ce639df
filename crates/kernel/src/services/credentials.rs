//! Credential validation for the session and API-key schemes.

use std::sync::Arc;

use tracing::debug;

use super::session_token::SessionTokens;
use crate::access::origin_allowed;
use crate::error::{AppError, AppResult};
use crate::models::{AuthUser, Site};
use crate::store::EntityStore;

/// Resolves raw credentials into an identity.
#[derive(Clone)]
pub struct CredentialValidator {
    store: Arc<dyn EntityStore>,
    tokens: SessionTokens,
}

impl CredentialValidator {
    pub fn new(store: Arc<dyn EntityStore>, tokens: SessionTokens) -> Self {
        Self { store, tokens }
    }

    /// Authenticate an `Authorization` header value of the form `Bearer <token>`.
    pub async fn authenticate_session(&self, header: Option<&str>) -> AppResult<AuthUser> {
        let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return Err(AppError::Unauthenticated(
                "Not authorized, no token".to_string(),
            ));
        };

        let user_id = match self.tokens.verify(token).and_then(|c| c.user_id()) {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "invalid session token");
                return Err(token_failed());
            }
        };

        match self.store.find_user(user_id).await? {
            Some(user) => Ok(user.into()),
            None => {
                debug!(%user_id, "session token for unknown user");
                Err(token_failed())
            }
        }
    }

    /// Authenticate an `x-api-key` value, enforcing the site's origin list
    /// when the request carries an `Origin`.
    pub async fn authenticate_api_key(
        &self,
        api_key: Option<&str>,
        origin: Option<&str>,
    ) -> AppResult<Site> {
        let Some(api_key) = api_key.filter(|k| !k.is_empty()) else {
            return Err(AppError::Unauthenticated(
                "Not authorized, API key required".to_string(),
            ));
        };

        let Some(site) = self.store.find_active_site_by_api_key(api_key).await? else {
            debug!("unknown or inactive API key");
            return Err(AppError::Unauthenticated("Invalid API key".to_string()));
        };

        if let Some(origin) = origin
            && !origin_allowed(&site.allowed_origins, origin)
        {
            debug!(site_id = %site.site_id, %origin, "origin not allowed");
            return Err(AppError::Forbidden("Origin not allowed".to_string()));
        }

        Ok(site)
    }
}

fn token_failed() -> AppError {
    AppError::Unauthenticated("Not authorized, token failed".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::User;
    use crate::store::MemoryStore;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes-long!!";

    fn site(api_key: &str, is_active: bool, origins: &[&str]) -> Site {
        let now = Utc::now();
        Site {
            id: Uuid::now_v7(),
            site_id: format!("site-{api_key}"),
            name: "Site".to_string(),
            domain: "https://a.example.com".to_string(),
            description: None,
            api_key: api_key.to_string(),
            is_active,
            owner: Uuid::now_v7(),
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    async fn validator() -> (CredentialValidator, Arc<MemoryStore>, SessionTokens) {
        let store = Arc::new(MemoryStore::new());
        let tokens = SessionTokens::new(SECRET, 30);
        (
            CredentialValidator::new(store.clone(), tokens.clone()),
            store,
            tokens,
        )
    }

    #[tokio::test]
    async fn session_resolves_known_user() {
        let (validator, store, tokens) = validator().await;
        let user = User::new("Ada", "ada@example.com", "secret1", false).unwrap();
        store.insert_user(&user).await.unwrap();

        let header = format!("Bearer {}", tokens.issue(user.id).unwrap());
        let auth = validator.authenticate_session(Some(&header)).await.unwrap();
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.email, "ada@example.com");
    }

    #[tokio::test]
    async fn session_rejects_missing_or_malformed_header() {
        let (validator, _, _) = validator().await;
        for header in [None, Some("Token abc"), Some("Bearer not-a-jwt")] {
            let err = validator.authenticate_session(header).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated(_)), "{header:?}");
        }
    }

    #[tokio::test]
    async fn session_rejects_unknown_subject() {
        let (validator, _, tokens) = validator().await;
        let header = format!("Bearer {}", tokens.issue(Uuid::now_v7()).unwrap());
        let err = validator
            .authenticate_session(Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn api_key_resolves_active_site() {
        let (validator, store, _) = validator().await;
        let s = site("key-1", true, &[]);
        store.insert_site(&s).await.unwrap();

        let found = validator
            .authenticate_api_key(Some("key-1"), None)
            .await
            .unwrap();
        assert_eq!(found.id, s.id);
    }

    #[tokio::test]
    async fn api_key_missing_unknown_or_inactive_is_unauthenticated() {
        let (validator, store, _) = validator().await;
        store.insert_site(&site("off", false, &[])).await.unwrap();

        for key in [None, Some(""), Some("nope"), Some("off")] {
            let err = validator.authenticate_api_key(key, None).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated(_)), "{key:?}");
        }
    }

    #[tokio::test]
    async fn api_key_enforces_origin_list() {
        let (validator, store, _) = validator().await;
        store
            .insert_site(&site("key-2", true, &["*.example.com"]))
            .await
            .unwrap();

        assert!(
            validator
                .authenticate_api_key(Some("key-2"), Some("https://blog.example.com"))
                .await
                .is_ok()
        );
        let err = validator
            .authenticate_api_key(Some("key-2"), Some("https://evil.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
