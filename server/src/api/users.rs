//! Account endpoints: signup, signin, profile, push-token registration.

use crate::auth::{CurrentUser, password};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use gatherly_core::DomainError;
use gatherly_core::account::NewAccount;
use gatherly_core::store::{AccountStore, SessionStore};
use gatherly_core::types::AccountId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Email address; must be unique.
    pub email: String,
    /// Password; at least 8 characters.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Signup response.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// The created account id.
    pub account_id: AccountId,
}

/// Signin request.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Signin response.
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    /// Opaque bearer token for the `Authorization` header.
    pub token: Uuid,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Accumulated loyalty points.
    pub points: i64,
}

/// Push-token registration request. A null token unregisters the device.
#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    /// Delivery address issued by the push gateway.
    pub token: Option<String>,
}

fn validate_signup(request: &SignupRequest) -> Result<(), ApiError> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(DomainError::validation("email is not valid").into());
    }
    if request.password.chars().count() < 8 {
        return Err(DomainError::validation("password must be at least 8 characters").into());
    }
    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        return Err(DomainError::validation("first and last name are required").into());
    }
    Ok(())
}

/// Register an account.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    validate_signup(&request)?;

    let password_hash = password::hash(&request.password)?;
    let account = state
        .accounts
        .insert(NewAccount {
            email: request.email,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
        })
        .await?;

    tracing::info!(account_id = %account.id, "account created");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            account_id: account.id,
        }),
    ))
}

/// Exchange credentials for a bearer session token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    let account = state
        .accounts
        .find_by_email(&request.email)
        .await?
        .ok_or(DomainError::InvalidCredentials)?;

    if !password::verify(&request.password, &account.password_hash) {
        return Err(DomainError::InvalidCredentials.into());
    }

    state.accounts.record_login(account.id, Utc::now()).await?;
    let session = state.sessions.create(account.id, state.session_ttl).await?;

    tracing::info!(account_id = %account.id, "signin succeeded");
    Ok(Json(SigninResponse {
        token: session.token,
        expires_at: session.expires_at,
    }))
}

/// The caller's own profile.
pub async fn profile(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state
        .accounts
        .find(user.account_id)
        .await?
        .ok_or_else(|| DomainError::not_found("account", user.account_id))?;

    Ok(Json(ProfileResponse {
        first_name: account.first_name,
        last_name: account.last_name,
        email: account.email,
        points: account.points,
    }))
}

/// Register (or clear) the caller's push delivery address.
pub async fn register_push_token(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<PushTokenRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .accounts
        .set_push_token(user.account_id, request.token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
