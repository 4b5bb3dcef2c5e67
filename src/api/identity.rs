//! Caller identity
//!
//! Authentication happens in front of this service; the authenticated user
//! id is forwarded in the `X-User-Id` header.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::error::ApiError;
use crate::store::UserId;

/// Header carrying the authenticated user id
pub const USER_HEADER: &str = "x-user-id";

/// Extractor for the calling user
///
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> String {
///     format!("Hello, user {}", user)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        parse_user_id(raw.to_str().unwrap_or_default()).map(CurrentUser)
    }
}

fn parse_user_id(value: &str) -> Result<UserId, ApiError> {
    match value.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(UserId(id)),
        _ => Err(ApiError::Unauthorized(format!(
            "Invalid {} header",
            USER_HEADER
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CurrentUser, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header() {
        let user = extract(Some("42")).await.unwrap();
        assert_eq!(user, CurrentUser(UserId(42)));
    }

    #[tokio::test]
    async fn test_missing_or_invalid_header() {
        assert!(matches!(extract(None).await, Err(ApiError::Unauthorized(_))));
        assert!(matches!(extract(Some("abc")).await, Err(ApiError::Unauthorized(_))));
        assert!(matches!(extract(Some("0")).await, Err(ApiError::Unauthorized(_))));
    }
}
