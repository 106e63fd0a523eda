//! HTTP surface.
//!
//! Thin axum layer over the core: an admission/authentication middleware
//! that runs before every handler, a uniform JSON response envelope, and
//! the echo/ping endpoints. The core never sees HTTP types; this module
//! owns the mapping from [`crate::gate::Decision`] and token validation
//! results to status codes (429, 400, 401).

mod handlers;
mod middleware;
mod response;
mod server;

pub use middleware::TOKEN_HEADER;
pub use response::{ApiResponse, ErrorBody};
pub use server::{build_state, router, serve, AppState};
