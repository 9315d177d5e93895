//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mediation Registry API",
        version = "0.1.0",
        description = "Mediator registry and case ledger for escrow-backed dispute mediation."
    ),
    paths(
        // Mediators
        crate::routes::mediators::create_mediator,
        crate::routes::mediators::list_mediators,
        crate::routes::mediators::get_mediator,
        crate::routes::mediators::get_mediator_status,
        crate::routes::mediators::update_mediator_status,
        crate::routes::mediators::set_mediation_ledger,
        // Cases
        crate::routes::cases::create_case,
        crate::routes::cases::company_create_case,
        crate::routes::cases::get_case,
        crate::routes::cases::join_as_second_party,
        crate::routes::cases::join_case,
        crate::routes::cases::first_party_members,
        crate::routes::cases::second_party_members,
        crate::routes::cases::assign_mediator,
        crate::routes::cases::assign_random_mediator,
        crate::routes::cases::close_case,
        // Events
        crate::routes::events::list_events,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Mediator DTOs
        crate::routes::mediators::MediatorRecord,
        crate::routes::mediators::CreateMediatorRequest,
        crate::routes::mediators::MediatorStatus,
        crate::routes::mediators::UpdateStatusRequest,
        crate::routes::mediators::LedgerSetting,
        // Case DTOs
        crate::routes::cases::CaseRecord,
        crate::routes::cases::DepositRecord,
        crate::routes::cases::CreateCaseRequest,
        crate::routes::cases::CompanyCaseRequest,
        crate::routes::cases::DepositRequest,
        crate::routes::cases::JoinRequest,
        crate::routes::cases::AssignRequest,
        crate::routes::cases::AssignmentRecord,
        // Events
        crate::routes::events::EventLog,
    )),
    tags(
        (name = "mediators", description = "Mediator Registry API"),
        (name = "cases", description = "Case Ledger API"),
        (name = "events", description = "Event Log API"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
