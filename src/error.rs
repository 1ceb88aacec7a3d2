// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::DatabaseError;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every failure that reaches the client goes through `to_json`, which produces the
/// `{ "success": false, "message": ... }` envelope.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),
    InvalidToken(String),
    TokenExpired(String),
    InvalidCredentials(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),
    RouteNotFound {
        path: String,
        available_routes: Vec<String>,
    },

    // 405 Method Not Allowed
    MethodNotAllowed {
        method: String,
        path: String,
    },

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::InvalidToken(_) => 401,
            ApiError::TokenExpired(_) => 401,
            ApiError::InvalidCredentials(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::RouteNotFound { .. } => 404,
            ApiError::MethodNotAllowed { .. } => 405,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::InvalidToken(msg)
            | ApiError::TokenExpired(msg)
            | ApiError::InvalidCredentials(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::RouteNotFound { path, .. } => format!("Route {} not found", path),
            ApiError::MethodNotAllowed { method, path } => {
                format!("Method {} not allowed on {}", method, path)
            }
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::RouteNotFound {
                available_routes, ..
            } => {
                response["availableRoutes"] = json!(available_routes);
            }
            _ => {}
        }

        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHENTICATED",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::TokenExpired(_) => "TOKEN_EXPIRED",
            ApiError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            ApiError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn route_not_found(path: impl Into<String>, available_routes: Vec<String>) -> Self {
        ApiError::RouteNotFound {
            path: path.into(),
            available_routes,
        }
    }

    pub fn method_not_allowed(method: impl Into<String>, path: impl Into<String>) -> Self {
        ApiError::MethodNotAllowed {
            method: method.into(),
            path: path.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(msg) => ApiError::unauthorized(msg),
            AuthError::InvalidToken => ApiError::InvalidToken(err.to_string()),
            AuthError::TokenExpired => ApiError::TokenExpired(err.to_string()),
            AuthError::InvalidCredentials => ApiError::InvalidCredentials(err.to_string()),
            AuthError::Forbidden { .. } => ApiError::forbidden(err.to_string()),
            AuthError::Signing(msg) => {
                tracing::error!("Token signing failed: {}", msg);
                ApiError::internal_server_error("Could not issue token")
            }
            AuthError::Hashing(msg) => {
                tracing::error!("Password hashing failed: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Unavailable(reason) => {
                tracing::warn!("Database-backed route called in degraded mode: {}", reason);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Duplicate(msg) => ApiError::conflict(msg),
            DatabaseError::InvalidDocument(msg) => ApiError::validation_error(msg, None),
            other => {
                // Don't expose driver errors to clients
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
