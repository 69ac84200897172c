//! Health check endpoint.
//!
//! Used by load balancers and monitoring to verify the service is up.

use axum::http::StatusCode;

/// Simple liveness probe.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
