// Local identity provider endpoints
//
// These play the part of a hosted identity SDK: register an account, then
// trade credentials for a short-lived identity token to pass to sign-in.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use crate::db::{AccountResponse, CredentialsRequest, IdTokenResponse};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;

fn validate_credentials(request: &CredentialsRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.add("email", "Invalid email address");
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
    errors.finish()
}

/// POST /api/identity/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    validate_credentials(&request)?;

    let account = state
        .identity
        .create_account(request.email.trim(), &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// POST /api/identity/token
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<IdTokenResponse>, ApiError> {
    let id_token = state
        .identity
        .issue_id_token(request.email.trim(), &request.password)
        .await?;

    Ok(Json(IdTokenResponse {
        id_token,
        expires_in: state.identity.id_token_ttl_secs(),
    }))
}
