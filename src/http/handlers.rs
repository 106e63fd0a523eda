//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde_json::Value;

use super::response::ApiResponse;

/// Echo the JSON payload back to the caller.
///
/// A missing or malformed body is the caller's mistake, not a server
/// error: answer 400 inside the usual envelope.
pub async fn echo(payload: Result<Json<Value>, JsonRejection>) -> ApiResponse {
    match payload {
        Ok(Json(data)) => ApiResponse::ok(serde_json::json!({ "data": data })),
        Err(_) => ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "INVALID_PAYLOAD",
            "Missing or malformed JSON payload",
        ),
    }
}

/// Liveness probe.
pub async fn ping() -> ApiResponse {
    ApiResponse::ok(serde_json::json!({
        "message": "pong",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_payload() {
        let payload = serde_json::json!({"key": "value"});
        let response = echo(Ok(Json(payload.clone()))).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.response.unwrap()["data"], payload);
    }

    #[tokio::test]
    async fn test_ping_pongs() {
        let response = ping().await;

        assert_eq!(response.status, 200);
        let body = response.response.unwrap();
        assert_eq!(body["message"], "pong");
        assert!(body["timestamp"].is_string());
    }
}
