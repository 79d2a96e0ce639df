//! Site management routes. Every endpoint requires a session token.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::access::RequestContext;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::require_session;
use crate::models::{CreateSite, Site, UpdateSite};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateKeyResponse {
    pub message: &'static str,
    pub api_key: String,
}

/// GET /api/sites
async fn list_sites(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<Site>>> {
    Ok(Json(state.sites().list(&ctx).await?))
}

/// POST /api/sites
async fn create_site(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(input): JsonBody<CreateSite>,
) -> AppResult<(StatusCode, Json<Site>)> {
    let site = state.sites().create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(site)))
}

/// GET /api/sites/{id}
async fn get_site(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<Site>> {
    Ok(Json(state.sites().get(&ctx, &id).await?))
}

/// PUT /api/sites/{id}
async fn update_site(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateSite>,
) -> AppResult<Json<Site>> {
    Ok(Json(state.sites().update(&ctx, &id, input).await?))
}

/// DELETE /api/sites/{id}
async fn delete_site(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    state.sites().delete(&ctx, &id).await?;
    Ok(Json(json!({ "message": "Site removed" })))
}

/// POST /api/sites/{id}/regenerate-key
async fn regenerate_key(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<RegenerateKeyResponse>> {
    let api_key = state.sites().regenerate_api_key(&ctx, &id).await?;
    Ok(Json(RegenerateKeyResponse {
        message: "API key regenerated successfully",
        api_key,
    }))
}

/// Create the site router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/sites", get(list_sites).post(create_site))
        .route(
            "/api/sites/{id}",
            get(get_site).put(update_site).delete(delete_site),
        )
        .route("/api/sites/{id}/regenerate-key", post(regenerate_key))
        .route_layer(from_fn_with_state(state, require_session))
}
