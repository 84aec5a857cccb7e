//! Axum HTTP API for media assembly jobs.
//!
//! This crate provides:
//! - One POST route per job variant plus a probe-only route
//! - Error taxonomy mapped to HTTP status codes
//! - Liveness and readiness checks
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
