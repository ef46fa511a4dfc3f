//! API Routes
//!
//! Route handlers organized by functionality. Authenticated handlers pull
//! a bearer token from the Authorization header and resolve it against the
//! account (or admin) session table.

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod chat;
pub mod feed;
pub mod health;
pub mod media;
pub mod quiz;
pub mod scores;
pub mod stories;
pub mod tools;

use axum::http::{header, HeaderMap};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Pull the bearer token out of the Authorization header
fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)
}

/// Resolve the caller's user session to a uid
pub(crate) async fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<String> {
    let token = bearer_token(headers)?;
    Ok(state.accounts.resolve(token).await?)
}

/// Resolve the caller's admin session to an admin id
pub(crate) async fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<String> {
    let token = bearer_token(headers)?;
    Ok(state.admin.resolve_admin(token).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert!(bearer_token(&headers).is_err());
    }
}
