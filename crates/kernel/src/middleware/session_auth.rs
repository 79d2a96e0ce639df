//! Session token authentication middleware.
//!
//! Requires `Authorization: Bearer <token>`, verifies it and attaches the
//! resolved [`AuthUser`](crate::models::AuthUser) to the request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Reject the request with 401 unless it carries a valid session token.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match state
        .credentials()
        .authenticate_session(header.as_deref())
        .await
    {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
