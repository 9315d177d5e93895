//! # Event Log API
//!
//! Read-only access to the notifications emitted by the registry and the
//! ledger since the process started or the state was hydrated.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use mediate_ledger::LedgerEvent;
use mediate_registry::RegistryEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Both event logs, each in emission order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventLog {
    #[schema(value_type = Vec<Object>)]
    pub registry: Vec<RegistryEvent>,
    #[schema(value_type = Vec<Object>)]
    pub ledger: Vec<LedgerEvent>,
}

/// Build the event log router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/events", get(list_events))
}

/// GET /v1/events — Registry and ledger events.
#[utoipa::path(
    get,
    path = "/v1/events",
    responses(
        (status = 200, description = "Event logs", body = EventLog),
    ),
    tag = "events"
)]
pub async fn list_events(State(state): State<AppState>) -> Json<EventLog> {
    let engine = state.engine.lock();
    Json(EventLog {
        registry: engine.registry_events().to_vec(),
        ledger: engine.ledger_events().to_vec(),
    })
}
