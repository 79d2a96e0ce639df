//! Account routes: registration, login and the current account.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::access::RequestContext;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::require_session;
use crate::models::{AuthUser, LoginUser, RegisterUser};
use crate::services::AuthSession;
use crate::state::AppState;

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterUser>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    let session = state.accounts().register(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginUser>,
) -> AppResult<Json<AuthSession>> {
    Ok(Json(state.accounts().login(input).await?))
}

/// GET /api/auth/me
async fn me(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Json<AuthUser>> {
    Ok(Json(state.accounts().me(&ctx)?))
}

/// Create the account router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route(
            "/api/auth/me",
            get(me).route_layer(from_fn_with_state(state, require_session)),
        )
}
