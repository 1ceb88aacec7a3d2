use axum::extract::State;

use crate::auth::Principal;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/auth/me - profile of the principal the token was issued to
///
/// The token can outlive the account; a verified principal without a stored user is a 404.
pub async fn me_get(State(state): State<AppState>, principal: Principal) -> ApiResult<UserProfile> {
    let user = state
        .users
        .find_by_id(&principal.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(user.profile()))
}
