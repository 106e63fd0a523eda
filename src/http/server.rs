//! Server assembly.
//!
//! Builds the shared state from validated settings and wires the router.
//! The gate is constructed exactly once here and shared via `Arc`; every
//! evaluation path sees the same activity log for the life of the process.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::config::Settings;
use crate::error::{AdmitError, AdmitResult};
use crate::gate::{AdmissionGate, AllowList};
use crate::token::TokenAuthority;

use super::{handlers, middleware};

/// Shared application state.
pub struct AppState {
    /// The process-wide admission gate.
    pub gate: Arc<AdmissionGate>,
    /// Token authority, present only when token auth is required.
    pub authority: Option<Arc<TokenAuthority>>,
    /// Whether to log each admitted/denied request.
    pub log_requests: bool,
}

/// Build the shared state from validated settings.
///
/// Fails on any secret provisioning problem; a misconfigured daemon must
/// not start.
pub fn build_state(settings: &Settings) -> AdmitResult<Arc<AppState>> {
    let allowlist = if settings.whitelist.enabled {
        Some(AllowList::new(&settings.whitelist.clients))
    } else {
        None
    };

    let gate = Arc::new(AdmissionGate::new(
        settings.rate_limit.max_requests,
        settings.rate_limit.window_seconds,
        allowlist,
    ));

    let authority = if settings.security.require_token {
        let secret = settings.resolve_secret()?.ok_or_else(|| AdmitError::Config {
            message: "Token auth requires a configured secret".to_string(),
        })?;
        Some(Arc::new(TokenAuthority::new(
            &secret,
            settings.security.token_bucket_seconds,
        )?))
    } else {
        None
    };

    Ok(Arc::new(AppState {
        gate,
        authority,
        log_requests: settings.logging.log_requests,
    }))
}

/// Build the router with the admission middleware ahead of every route.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/v1/echo",
            get(handlers::echo)
                .post(handlers::echo)
                .delete(handlers::echo),
        )
        .route("/api/v1/ping", get(handlers::ping))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admit,
        ))
}

/// Bind and serve until the shutdown future resolves.
pub async fn serve<F>(settings: Settings, shutdown: F) -> AdmitResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&settings)?;

    // Periodic eviction of idle clients from the activity log
    state.gate.start_cleanup_task(Duration::from_secs(
        settings.rate_limit.cleanup_interval_seconds,
    ));

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr)
        .await
        .map_err(|e| AdmitError::Server {
            message: format!("Failed to bind {}: {}", settings.server.bind_addr, e),
        })?;

    info!(addr = %settings.server.bind_addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| AdmitError::Server {
        message: format!("Server failed: {}", e),
    })
}
