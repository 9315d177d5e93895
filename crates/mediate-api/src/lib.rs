//! # mediate-api — HTTP Service for the Mediation Registry
//!
//! Exposes the mediator registry and the case ledger over JSON/HTTP.
//!
//! ## Surface
//!
//! | Prefix | Module | Purpose |
//! |--------|--------|---------|
//! | `/v1/mediators`, `/v1/registry` | [`routes::mediators`] | Mediator catalog and flags |
//! | `/v1/cases` | [`routes::cases`] | Case lifecycle and escrow |
//! | `/v1/events` | [`routes::events`] | Registry and ledger notifications |
//! | `/v1/metrics` | [`middleware::metrics`] | Request counters |
//! | `/openapi.json` | [`openapi`] | Generated OpenAPI document |
//! | `/health/*` | here | Liveness and readiness probes (no auth) |
//!
//! ## Middleware Stack (outermost first)
//!
//! TraceLayer, then metrics, then auth. Health probes sit outside the stack
//! so orchestrators can reach them without credentials.
//!
//! ## Persistence
//!
//! With `DATABASE_URL` set, every successful mutation is written through to
//! Postgres after it commits in memory, and the engine is rebuilt from the
//! database at startup. Without it the service is in-memory only.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::mediators::router())
        .merge(routes::cases::router())
        .merge(routes::events::router())
        .merge(openapi::router())
        .route(
            "/v1/metrics",
            axum::routing::get(middleware::metrics::metrics_snapshot),
        )
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}
