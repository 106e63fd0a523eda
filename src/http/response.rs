//! JSON response envelope.
//!
//! Every response the daemon sends, success or denial, uses the same JSON
//! shape. Denials are deliberately not special-cased into plain text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uniform response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status, mirrored into the body.
    pub status: u16,

    /// Unique identifier for this response, for log correlation.
    pub request_id: Uuid,

    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,

    /// Error details on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Error details in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code (e.g., "RATE_LIMITED", "NOT_WHITELISTED").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

impl ApiResponse {
    /// Create a 200 success response.
    pub fn ok(response: serde_json::Value) -> Self {
        Self {
            status: 200,
            request_id: Uuid::new_v4(),
            response: Some(response),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            request_id: Uuid::new_v4(),
            response: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
