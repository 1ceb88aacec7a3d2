use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `{ "success": true, "data": ... }`
    Data,
    /// The payload's own fields beside `"success": true`
    Inline,
}

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub count: Option<usize>,
    shape: Shape,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
            count: None,
            shape: Shape::Data,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::success(data).with_status(StatusCode::CREATED)
    }

    /// Put the payload's fields at the top level of the envelope (payload must be an object)
    pub fn inline(data: T) -> Self {
        Self {
            shape: Shape::Inline,
            ..Self::success(data)
        }
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let envelope = match (self.shape, data_value) {
            (Shape::Inline, Value::Object(mut fields)) => {
                fields.insert("success".to_string(), Value::Bool(true));
                Value::Object(fields)
            }
            (_, data) => {
                let mut envelope = json!({ "success": true });
                if let Some(count) = self.count {
                    envelope["count"] = json!(count);
                }
                envelope["data"] = data;
                envelope
            }
        };

        (status, Json(envelope)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn wraps_data_with_count() {
        let response = ApiResponse::success(vec![1, 2]).with_count(2).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, json!({ "success": true, "count": 2, "data": [1, 2] }));
    }

    #[tokio::test]
    async fn inline_merges_fields() {
        let response = ApiResponse::inline(json!({ "token": "t" }))
            .with_status(StatusCode::CREATED)
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body(response).await, json!({ "success": true, "token": "t" }));
    }

    #[tokio::test]
    async fn created_is_201_with_data() {
        let response = ApiResponse::created(json!({ "id": "t1" })).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body(response).await, json!({ "success": true, "data": { "id": "t1" } }));
    }
}
