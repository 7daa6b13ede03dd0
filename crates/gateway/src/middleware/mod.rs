//! Gateway middleware

pub mod permission;
pub mod rate_limit;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use thesisdesk_common::metrics::RequestMetrics;

/// Record request count and latency per matched route
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let metrics = RequestMetrics::start(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
