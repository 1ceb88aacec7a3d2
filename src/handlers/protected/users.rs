use axum::extract::State;

use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/users - every account, admin only (enforced by the route's gate)
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    let users: Vec<UserProfile> = state.users.list().await?.iter().map(|u| u.profile()).collect();
    let count = users.len();
    Ok(ApiResponse::success(users).with_count(count))
}
