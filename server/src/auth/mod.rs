//! Bearer-credential checking.
//!
//! Axum extractors for protected routes:
//! - [`BearerToken`] pulls the raw token out of the `Authorization` header
//! - [`CurrentUser`] resolves it to an account through the session store
//!
//! Handlers take `CurrentUser` as a parameter to require authentication;
//! there is no middleware stack to configure per route.

pub mod password;

use crate::error::ApiError;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use gatherly_core::store::SessionStore;
use gatherly_core::types::AccountId;
use uuid::Uuid;

/// Bearer token extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                ApiError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .to_string();

        if token.is_empty() {
            return Err(ApiError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token))
    }
}

/// The authenticated account behind a request.
///
/// Extraction fails with 401 when the token is absent, malformed, unknown,
/// or expired.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    /// The authenticated account id.
    pub account_id: AccountId,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;

        let token = Uuid::parse_str(&bearer.0)
            .map_err(|_| ApiError::unauthorized("Invalid session token format"))?;

        let account_id = state
            .sessions
            .validate(token)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        Ok(Self { account_id })
    }
}
