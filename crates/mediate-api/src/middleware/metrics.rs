//! # Request Metrics
//!
//! In-process counters, served as a JSON snapshot at `/v1/metrics`.
//! Client rejections (4xx) and server failures (5xx) are counted apart so a
//! burst of bad deposits does not read like a database outage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    requests: Arc<AtomicU64>,
    mutations: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    /// Non-GET requests that completed successfully.
    pub mutations: u64,
    /// 4xx responses.
    pub rejected: u64,
    /// 5xx responses.
    pub failed: u64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            mutations: self.mutations.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Middleware that classifies each response into the counters.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.requests.fetch_add(1, Ordering::Relaxed);
        let status = response.status();
        if status.is_server_error() {
            m.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(%method, path = %path, status = status.as_u16(), "request failed");
        } else if status.is_client_error() {
            m.rejected.fetch_add(1, Ordering::Relaxed);
        } else if method != Method::GET && method != Method::HEAD {
            m.mutations.fetch_add(1, Ordering::Relaxed);
        }
    }

    response
}

/// GET /v1/metrics
pub async fn metrics_snapshot(Extension(metrics): Extension<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}
