//! Token authentication extractor.
//!
//! Clients send `Authorization: Token <key>` (`Bearer` is accepted too). The
//! key is resolved to a user through the token table, with a short-lived
//! in-memory cache in front of it.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};
use model::entities::{token, user};
use tracing::{debug, trace, warn};

use crate::error::ApiError;
use crate::schemas::AppState;

const MISSING_CREDENTIALS: &str = "Authentication credentials were not provided.";
const INVALID_HEADER: &str = "Invalid token header.";
const INVALID_TOKEN: &str = "Invalid token.";
const INACTIVE_USER: &str = "User inactive or deleted.";

/// Extractor that requires a valid API token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(auth: AuthUser) -> String {
///     format!("Hello, {}!", auth.user.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: user::Model,
    /// The key the request authenticated with, used to evict the cache entry.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::Unauthorized(MISSING_CREDENTIALS))?;
        let key = parse_token_header(header)?;

        if let Some(user) = state.token_cache.get(&key).await {
            trace!("Token cache hit for user {}", user.id);
            return Ok(Self { user, token: key });
        }

        let user = match token::find_user(&state.db, &key).await? {
            Some(user) => user,
            None => {
                warn!("Rejected unknown token");
                return Err(ApiError::Unauthorized(INVALID_TOKEN));
            }
        };

        if !user.is_active {
            warn!("Rejected token of inactive user {}", user.id);
            return Err(ApiError::Unauthorized(INACTIVE_USER));
        }

        debug!("Authenticated user {}", user.id);
        state.token_cache.insert(key.clone(), user.clone()).await;
        Ok(Self { user, token: key })
    }
}

/// Splits `Token <key>` / `Bearer <key>` and returns the key.
fn parse_token_header(header: &HeaderValue) -> Result<String, ApiError> {
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized(INVALID_HEADER))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().ok_or(ApiError::Unauthorized(MISSING_CREDENTIALS))?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized(MISSING_CREDENTIALS));
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(key.to_string()),
        _ => Err(ApiError::Unauthorized(INVALID_HEADER)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<String, ApiError> {
        parse_token_header(&HeaderValue::from_str(raw).unwrap())
    }

    #[test]
    fn test_parse_token_scheme() {
        assert_eq!(parse("Token abc123").unwrap(), "abc123");
        assert_eq!(parse("token abc123").unwrap(), "abc123");
        assert_eq!(parse("Bearer abc123").unwrap(), "abc123");
    }

    #[test]
    fn test_parse_rejects_malformed_headers() {
        assert!(matches!(parse("Basic dXNlcjpwYXNz"), Err(ApiError::Unauthorized(_))));
        assert!(matches!(parse("Token"), Err(ApiError::Unauthorized(INVALID_HEADER))));
        assert!(matches!(parse("Token a b"), Err(ApiError::Unauthorized(INVALID_HEADER))));
        assert!(matches!(parse(""), Err(ApiError::Unauthorized(MISSING_CREDENTIALS))));
    }
}
