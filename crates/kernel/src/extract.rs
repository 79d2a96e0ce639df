//! Request extractors that reject with [`AppError`].

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
///
/// Same as [`axum::Json`] but a body that fails to parse is reported through
/// [`AppError`], so clients always get the JSON error shape with a 400.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Flag {
        published: bool,
    }

    fn request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn parses_valid_body() {
        let req = request(r#"{"published":true}"#);
        let JsonBody(flag) = JsonBody::<Flag>::from_request(req, &()).await.unwrap();
        assert!(flag.published);
    }

    #[tokio::test]
    async fn wrong_type_is_a_bad_request() {
        let err = JsonBody::<Flag>::from_request(request(r#"{"published":"yes"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedBody(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn truncated_body_is_a_bad_request() {
        let err = JsonBody::<Flag>::from_request(request(r#"{"published":"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
