use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Validated caller identity taken from `Authorization: Bearer <token>`.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::MissingToken)?;

        let token = bearer_token(header).ok_or(AppError::MissingToken)?;

        let keys = JwtKeys::from_ref(state);
        let subject = keys.decode(token).ok_or_else(|| {
            warn!("invalid or expired token");
            AppError::InvalidOrExpiredToken
        })?;

        // A signed token whose subject is not a user id is still unusable.
        let user_id = subject.parse::<i64>().map_err(|_| {
            warn!(%subject, "token subject is not a user id");
            AppError::InvalidOrExpiredToken
        })?;

        Ok(AuthUser(user_id))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
