//! HTTP Request Handlers
//!
//! Submission intake plus the operational endpoints.

pub mod health;
pub mod submissions;

use axum::{routing::get, Router};

use crate::{metrics, state::AppState};

/// Create all API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/submissions", submissions::routes())
}

/// Prometheus scrape route, served outside the versioned API
pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(|| async { metrics::render() }))
}
