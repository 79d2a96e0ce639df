//! Site API key authentication middleware.
//!
//! Reads the raw key from `x-api-key`, checks the `Origin` header against the
//! site's allow-list and attaches the [`Site`](crate::models::Site) to the
//! request extensions. An `Origin` header that is not valid text is refused.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::ORIGIN},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying a site's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject the request unless it carries an active site's API key from an
/// allowed origin.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let api_key = header_value(&request, API_KEY_HEADER);
    let origin = match request.headers().get(ORIGIN).map(|v| v.to_str()) {
        None => None,
        Some(Ok(origin)) => Some(origin.to_owned()),
        Some(Err(_)) => {
            return AppError::Forbidden("Origin not allowed".to_string()).into_response();
        }
    };

    match state
        .credentials()
        .authenticate_api_key(api_key.as_deref(), origin.as_deref())
        .await
    {
        Ok(site) => {
            request.extensions_mut().insert(site);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn header_value(request: &Request<Body>, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
