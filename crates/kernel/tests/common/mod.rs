#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every test builds its own [`TestApp`]: the real router and services over a
//! fresh in-memory store, so tests never share data.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use quire_kernel::config::Config;
use quire_kernel::models::User;
use quire_kernel::routes::build_router;
use quire_kernel::state::AppState;
use quire_kernel::store::MemoryStore;
use quire_test_utils::test_account;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test application wrapper using the real kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// A registered account and its session token.
pub struct TestAccount {
    pub id: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::from_vars(|key| match key {
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => None,
        })
        .expect("test configuration");

        let state = AppState::with_store(&config, Arc::new(MemoryStore::new()));
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Send a request through the router.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(request).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Method::GET, uri, None, None).await
    }

    /// Send a request authenticated with a site API key.
    pub async fn get_with_api_key(
        &self,
        uri: &str,
        api_key: &str,
        origin: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("x-api-key", api_key);
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Register an account and return its id and session token.
    pub async fn register(&self, email: &str) -> TestAccount {
        let response = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(test_account("Tester", email, "password123")),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response_json(response).await;
        TestAccount {
            id: body["id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Register an administrator directly through the store.
    pub async fn register_admin(&self, email: &str) -> TestAccount {
        let user = User::new("Admin", email, "password123", true).unwrap();
        self.state.store().insert_user(&user).await.unwrap();

        let response = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        TestAccount {
            id: user.id.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }
}

pub async fn response_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}
