use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::error::{AppError, AppResult};

/// Per-IP limiter applied in front of every route
pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// One token every `replenish_ms`, at most `burst` queued. Needs the router to
/// be served with `into_make_service_with_connect_info`.
pub fn create_global_governor(replenish_ms: u64, burst: u32) -> AppResult<GlobalGovernorLayer> {
    let config = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(burst)
        .finish()
        .ok_or_else(|| AppError::Internal("Invalid rate limiter settings".to_string()))?;

    Ok(GovernorLayer::new(Arc::new(config)))
}

pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(client_ip = %addr.ip(), %method, %uri, "rate limited");
    } else if status.is_server_error() {
        tracing::warn!(client_ip = %addr.ip(), %method, %uri, %status, elapsed_ms, "request failed");
    } else {
        tracing::debug!(client_ip = %addr.ip(), %method, %uri, %status, elapsed_ms, "request");
    }

    response
}
