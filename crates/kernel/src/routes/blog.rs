//! Blog routes.
//!
//! Reads are public and count views. Writes require a session token. The
//! external tenant feed requires the site's API key.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::access::RequestContext;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::{require_api_key, require_session};
use crate::models::{Blog, BlogView, CreateBlog, UpdateBlog};
use crate::state::AppState;
use crate::store::{BlogFilter, Page, PageRequest};

/// Query string accepted by the listing endpoints.
///
/// Everything arrives as text; unrecognised values are ignored rather than
/// rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    pub keyword: Option<String>,
    pub published: Option<String>,
    pub category: Option<String>,
    pub site_id: Option<String>,
    pub page_number: Option<String>,
}

impl BlogListQuery {
    /// `published` is only a filter when it is exactly `true` or `false`.
    fn published(&self) -> Option<bool> {
        match self.published.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }

    pub fn filter(&self) -> BlogFilter {
        BlogFilter::new()
            .with_keyword(self.keyword.clone())
            .with_published(self.published())
            .with_category(self.category.clone())
            .for_tenant(self.site_id.clone())
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::parse(self.page_number.as_deref())
    }
}

/// GET /api/blogs
async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> AppResult<Json<Page<BlogView>>> {
    let page = state.blogs().list(&query.filter(), query.page()).await?;
    Ok(Json(page))
}

/// POST /api/blogs
async fn create_blog(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(input): JsonBody<CreateBlog>,
) -> AppResult<(StatusCode, Json<Blog>)> {
    let blog = state.blogs().create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

/// GET /api/blogs/categories
async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.blogs().distinct_categories().await?))
}

/// GET /api/blogs/user
async fn list_own_blogs(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<Blog>>> {
    Ok(Json(state.blogs().list_by_author(&ctx).await?))
}

/// GET /api/blogs/slug/{slug}
async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogView>> {
    Ok(Json(state.blogs().get_by_slug(&slug).await?))
}

/// GET /api/blogs/share/{link}
async fn get_by_shareable_link(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> AppResult<Json<BlogView>> {
    Ok(Json(state.blogs().get_by_shareable_link(&link).await?))
}

/// GET /api/blogs/{id}
async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BlogView>> {
    Ok(Json(state.blogs().get_by_id(&id).await?))
}

/// PUT /api/blogs/{id}
async fn update_blog(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateBlog>,
) -> AppResult<Json<Blog>> {
    Ok(Json(state.blogs().update(&ctx, &id, input).await?))
}

/// DELETE /api/blogs/{id}
async fn delete_blog(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    state.blogs().delete(&ctx, &id).await?;
    Ok(Json(json!({ "message": "Blog removed" })))
}

/// GET /api/blogs/site/{site_id}
async fn list_site_blogs(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    Query(query): Query<BlogListQuery>,
) -> AppResult<Json<Page<BlogView>>> {
    let page = state
        .blogs()
        .list_for_site(&site_id, query.filter(), query.page())
        .await?;
    Ok(Json(page))
}

/// GET /api/blogs/external/site/{site_id}
async fn list_external_site_blogs(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(site_id): Path<String>,
    Query(query): Query<BlogListQuery>,
) -> AppResult<Json<Page<BlogView>>> {
    let page = state
        .blogs()
        .list_for_api_site(&ctx, &site_id, query.filter(), query.page())
        .await?;
    Ok(Json(page))
}

/// Create the blog router.
pub fn router(state: AppState) -> Router<AppState> {
    let session = || from_fn_with_state(state.clone(), require_session);

    Router::new()
        .route(
            "/api/blogs",
            get(list_blogs).merge(post(create_blog).route_layer(session())),
        )
        .route("/api/blogs/categories", get(list_categories))
        .route("/api/blogs/user", get(list_own_blogs).route_layer(session()))
        .route("/api/blogs/slug/{slug}", get(get_by_slug))
        .route("/api/blogs/share/{link}", get(get_by_shareable_link))
        .route("/api/blogs/site/{site_id}", get(list_site_blogs))
        .route(
            "/api/blogs/external/site/{site_id}",
            get(list_external_site_blogs)
                .route_layer(from_fn_with_state(state.clone(), require_api_key)),
        )
        .route(
            "/api/blogs/{id}",
            get(get_blog).merge(
                put(update_blog)
                    .delete(delete_blog)
                    .route_layer(session()),
            ),
        )
}
