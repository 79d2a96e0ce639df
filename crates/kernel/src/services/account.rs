//! Account registration and login.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::session_token::SessionTokens;
use crate::access::RequestContext;
use crate::error::{AppError, AppResult};
use crate::models::fields::non_blank;
use crate::models::user::MIN_PASSWORD_LEN;
use crate::models::{AuthUser, LoginUser, RegisterUser, User};
use crate::store::{EntityStore, StoreError};

/// An account together with a freshly issued session token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    #[serde(flatten)]
    pub user: AuthUser,
    pub token: String,
}

/// Account operations.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn EntityStore>,
    tokens: SessionTokens,
}

impl AccountService {
    pub fn new(store: Arc<dyn EntityStore>, tokens: SessionTokens) -> Self {
        Self { store, tokens }
    }

    pub async fn register(&self, input: RegisterUser) -> AppResult<AuthSession> {
        let name = non_blank(input.name).ok_or_else(|| AppError::missing("name"))?;
        let email = non_blank(input.email)
            .map(|e| normalize_email(&e))
            .ok_or_else(|| AppError::missing("email"))?;
        let password = input
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::missing("password"))?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::ValidationFailed {
                field: "password",
                message: format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            });
        }

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(StoreError::unique("email").into());
        }

        let user = User::new(&name, &email, &password, false)?;
        self.store.insert_user(&user).await?;

        info!(user_id = %user.id, "account registered");
        self.session_for(user.into())
    }

    pub async fn login(&self, input: LoginUser) -> AppResult<AuthSession> {
        let email = input.email.as_deref().map(normalize_email).unwrap_or_default();
        let password = input.password.unwrap_or_default();

        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) if user.verify_password(&password) => user,
            _ => {
                debug!("login rejected");
                return Err(AppError::Unauthenticated(
                    "Invalid email or password".to_string(),
                ));
            }
        };

        info!(user_id = %user.id, "login");
        self.session_for(user.into())
    }

    /// The caller's own account.
    pub fn me(&self, ctx: &RequestContext) -> AppResult<AuthUser> {
        ctx.require_user().cloned()
    }

    fn session_for(&self, user: AuthUser) -> AppResult<AuthSession> {
        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { user, token })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes-long!!";

    fn service() -> (AccountService, SessionTokens) {
        let tokens = SessionTokens::new(SECRET, 30);
        (
            AccountService::new(Arc::new(MemoryStore::new()), tokens.clone()),
            tokens,
        )
    }

    fn register(email: &str, password: &str) -> RegisterUser {
        RegisterUser {
            name: Some("Ada".to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn register_issues_token_for_new_account() {
        let (service, tokens) = service();
        let session = service
            .register(register("Ada@Example.com ", "secret1"))
            .await
            .unwrap();

        assert_eq!(session.user.email, "ada@example.com");
        assert!(!session.user.is_admin);
        let claims = tokens.verify(&session.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), session.user.id);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (service, _) = service();

        let mut missing = register("a@example.com", "secret1");
        missing.name = None;
        assert!(matches!(
            service.register(missing).await,
            Err(AppError::ValidationFailed { field: "name", .. })
        ));

        assert!(matches!(
            service.register(register("a@example.com", "short")).await,
            Err(AppError::ValidationFailed {
                field: "password",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (service, _) = service();
        service
            .register(register("a@example.com", "secret1"))
            .await
            .unwrap();

        match service.register(register("A@example.com", "secret2")).await {
            Err(AppError::Conflict { field, .. }) => assert_eq!(field, "email"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_checks_password() {
        let (service, _) = service();
        let registered = service
            .register(register("a@example.com", "secret1"))
            .await
            .unwrap();

        let session = service
            .login(LoginUser {
                email: Some("a@example.com".to_string()),
                password: Some("secret1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(session.user.id, registered.user.id);

        for (email, password) in [("a@example.com", "wrong"), ("b@example.com", "secret1")] {
            let err = service
                .login(LoginUser {
                    email: Some(email.to_string()),
                    password: Some(password.to_string()),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated(_)));
        }
    }

    #[tokio::test]
    async fn me_requires_a_user() {
        let (service, _) = service();
        assert!(service.me(&RequestContext::Anonymous).is_err());

        let session = service
            .register(register("a@example.com", "secret1"))
            .await
            .unwrap();
        let me = service
            .me(&RequestContext::User(session.user.clone()))
            .unwrap();
        assert_eq!(me, session.user);
    }

    #[test]
    fn session_serializes_flat() {
        let session = AuthSession {
            user: AuthUser {
                id: uuid::Uuid::nil(),
                name: "Ada".to_string(),
                email: "a@example.com".to_string(),
                is_admin: false,
            },
            token: "t".to_string(),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["email"], "a@example.com");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["token"], "t");
    }
}
