//! Admission and authentication middleware.
//!
//! Runs ahead of every handler: gate first, token check second. A request
//! that fails either never reaches business logic.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::clock::unix_now;
use crate::gate::{Decision, DenyReason};

use super::response::ApiResponse;
use super::server::AppState;

/// Header carrying the client's rotating token.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Gate every request on admission, then (if configured) on a valid token.
pub async fn admit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client = addr.ip().to_string();
    let now = unix_now();

    if let Decision::Denied(reason) = state.gate.evaluate(&client, now) {
        if state.log_requests {
            warn!(
                client = %client,
                method = %request.method(),
                path = %request.uri().path(),
                reason = ?reason,
                "Request denied"
            );
        }
        return deny(reason);
    }

    if let Some(authority) = &state.authority {
        let token = request
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        let valid = token.is_some_and(|t| authority.validate_at(now, t));
        if !valid {
            if state.log_requests {
                warn!(
                    client = %client,
                    method = %request.method(),
                    path = %request.uri().path(),
                    "Token validation failed"
                );
            }
            return ApiResponse::error(
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Missing or invalid authentication token",
            )
            .into_response();
        }
    }

    if state.log_requests {
        info!(
            client = %client,
            method = %request.method(),
            path = %request.uri().path(),
            "Request admitted"
        );
    }

    next.run(request).await
}

/// Map a gate denial to its HTTP response.
fn deny(reason: DenyReason) -> Response {
    match reason {
        DenyReason::TooManyRequests => ApiResponse::error(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many requests",
        ),
        DenyReason::NotWhitelisted => ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "NOT_WHITELISTED",
            "Source address is not allow-listed",
        ),
    }
    .into_response()
}
