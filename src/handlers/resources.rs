//! Generic document controller shared by the temples, services, content, bookings and
//! subscriptions groups. The group's collection name arrives as a request extension so one
//! set of handlers serves every group; access rules live on the routes, not here.

use axum::extract::{Extension, Path, State};
use chrono::Utc;
use serde_json::Value;

use crate::auth::Principal;
use crate::database::Document;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::state::AppState;

/// Fields the server owns; silently dropped from request bodies
const RESERVED_FIELDS: [&str; 5] = ["id", "_id", "createdAt", "updatedAt", "createdBy"];

/// Collection backing a resource group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection(pub &'static str);

fn strip_reserved(mut body: Document) -> Document {
    for field in RESERVED_FIELDS {
        body.remove(field);
    }
    body
}

fn not_found(collection: &str, id: &str) -> ApiError {
    ApiError::not_found(format!("No {} record found with id of {}", collection, id))
}

/// GET /api/<group>
pub async fn list(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
) -> ApiResult<Vec<Document>> {
    let documents = state.resources.list(collection).await?;
    let count = documents.len();
    Ok(ApiResponse::success(documents).with_count(count))
}

/// GET /api/<group>/:id
pub async fn get_one(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let document = state
        .resources
        .get(collection, &id)
        .await?
        .ok_or_else(|| not_found(collection, &id))?;
    Ok(ApiResponse::success(document))
}

/// POST /api/<group>
pub async fn create(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    principal: Option<Principal>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<Document> {
    let mut document = strip_reserved(body);
    if document.is_empty() {
        return Err(ApiError::validation_error("Request body must not be empty", None));
    }

    document.insert("createdAt".to_string(), Value::String(Utc::now().to_rfc3339()));
    if let Some(principal) = principal {
        document.insert("createdBy".to_string(), Value::String(principal.id));
    }

    let created = state.resources.insert(collection, document).await?;
    let id = created.get("id").and_then(Value::as_str).unwrap_or("?");
    tracing::info!("Created {} record {}", collection, id);
    Ok(ApiResponse::created(created))
}

/// PUT /api/<group>/:id - partial update of the given fields
pub async fn update(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<Document> {
    let mut changes = strip_reserved(body);
    if changes.is_empty() {
        return Err(ApiError::validation_error("No fields to update", None));
    }
    changes.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));

    let updated = state
        .resources
        .update(collection, &id, changes)
        .await?
        .ok_or_else(|| not_found(collection, &id))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/<group>/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    if !state.resources.delete(collection, &id).await? {
        return Err(not_found(collection, &id));
    }
    tracing::info!("Deleted {} record {}", collection, id);
    Ok(ApiResponse::success(Document::new()))
}
