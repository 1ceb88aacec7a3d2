// handlers/public/auth/register.rs - POST /api/auth/register

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::utils::{validate_email_format, validate_name, validate_password, FieldErrors};
use crate::auth::{password, Role};
use crate::database::models::{User, UserProfile};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserProfile,
}

/// POST /api/auth/register - create an account and receive a token
///
/// Input: `{ "name", "email", "password", "role"? }`. Only the `user` role can be
/// self-assigned; administrators are created out of band (`darshan user create`).
///
/// Output (201): `{ "success": true, "token": "...", "user": { ... } }`
pub async fn register_post(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> ApiResult<TokenResponse> {
    if !state.config.security.allow_registration {
        return Err(ApiError::forbidden("Registration is disabled"));
    }

    let mut errors = FieldErrors::default();
    errors.check("name", validate_name(&payload.name));
    errors.check("email", validate_email_format(&payload.email));
    errors.check("password", validate_password(&payload.password));
    errors.into_result("Invalid registration details")?;

    let role = payload.role.unwrap_or_default();
    if role != Role::User {
        tracing::warn!("Rejected self-registration with role '{}' for {}", role, payload.email);
        return Err(ApiError::forbidden(format!("Role '{}' cannot be self-assigned", role)));
    }

    if state.users.find_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::conflict("User already exists"));
    }

    let hash = password::hash_password(&payload.password, state.config.security.bcrypt_cost).await?;
    let user = state
        .users
        .insert(User::new(payload.name.trim(), &payload.email, hash, role))
        .await?;

    let token = state.keys.issue(&user.principal())?;
    tracing::info!("Registered user {} ({})", user.id, user.email);

    Ok(ApiResponse::inline(TokenResponse {
        token,
        user: user.profile(),
    })
    .with_status(StatusCode::CREATED))
}
