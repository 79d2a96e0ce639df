//! HTTP route handlers.

pub mod auth;
pub mod blog;
pub mod health;
pub mod site;

use axum::Router;

use crate::state::AppState;

/// Assemble every route over the shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state.clone()))
        .merge(blog::router(state.clone()))
        .merge(site::router(state.clone()))
        .with_state(state)
}
