// handlers/public/auth/login.rs - POST /api/auth/login

use axum::extract::State;
use serde::Deserialize;

use super::register::TokenResponse;
use crate::auth::{password, AuthError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login - authenticate and receive a token
///
/// Unknown email and wrong password produce the same 401 so callers cannot probe
/// which accounts exist.
pub async fn login_post(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<TokenResponse> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Please provide an email and password"));
    }

    let Some(user) = state.users.find_by_email(&payload.email).await? else {
        tracing::info!("Login failed for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !password::verify_password(&payload.password, &user.password).await? {
        tracing::info!("Login failed for user {}", user.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.keys.issue(&user.principal())?;
    tracing::info!("User {} logged in", user.id);

    Ok(ApiResponse::inline(TokenResponse {
        token,
        user: user.profile(),
    }))
}
