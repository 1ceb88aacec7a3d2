// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Root banner, health check and token acquisition. None of these touch the gate, and
// root/health never touch the database, so they keep answering in degraded mode.

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub mod auth;

pub const SERVICE_NAME: &str = "Divine Darshan API";

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": format!(
            "{} is running. Available endpoints: /api/health, /api/auth, /api/temples, etc.",
            SERVICE_NAME
        ),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/health - always 200; `database` is informational only
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("{} is running", SERVICE_NAME),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "database": state.database.as_str(),
        })),
    )
}
