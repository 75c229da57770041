//! JWT session identity
//!
//! Validates the bearer token issued by the authentication service and
//! exposes the session user to handlers through two extractors:
//! [`CurrentUser`] for endpoints that require a signed-in user and
//! [`MaybeUser`] for views that merely personalize when one is present.
//! The user id always comes from the token subject; client-supplied ids
//! are never trusted for favorite/subscribe mutations.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Cookie used as a fallback when no Authorization header is present
const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at timestamp
    pub iat: usize,
    /// Expiration timestamp
    pub exp: usize,
}

impl Claims {
    /// The numeric user id carried in the subject
    pub fn user_id(&self) -> ApiResult<i64> {
        self.sub
            .parse()
            .map_err(|_| ApiError::unauthenticated("Token subject is not a user id"))
    }
}

/// Validate a token and return its claims
pub fn validate_token(token: &str, secret: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(data.claims)
}

/// Issue a token for a user id, used by tests and local tooling. The real
/// login flow lives in the authentication service.
pub fn generate_token(user_id: i64, secret: &str, ttl_secs: i64) -> ApiResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Pull the bearer token from the Authorization header, falling back to
/// the session cookie
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// The authenticated session user. Rejects the request with 401 when no
/// valid token is present.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        let claims = validate_token(&token, &state.config.jwt_secret)?;
        Ok(CurrentUser(claims.user_id()?))
    }
}

/// The session user when present. Anonymous requests resolve to `None`
/// instead of an error; a token that is present but invalid is still
/// rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<i64>);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(parts) else {
            return Ok(MaybeUser(None));
        };

        let claims = validate_token(&token, &state.config.jwt_secret)?;
        Ok(MaybeUser(Some(claims.user_id()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-value-for-unit-tests";

    #[test]
    fn token_round_trip_preserves_the_user_id() {
        let token = generate_token(42, SECRET, 3600).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_token(42, SECRET, -3600).unwrap();
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_token(42, SECRET, 3600).unwrap();
        assert!(validate_token(&token, "another-secret").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(validate_token("not-a-jwt", SECRET).is_err());
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "service-account".to_string(),
            iat: now as usize,
            exp: (now + 60) as usize,
        };
        assert!(claims.user_id().is_err());
    }
}
