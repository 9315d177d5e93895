//! # Mediator Registry API
//!
//! Registration, lookup, availability flags, and the trusted ledger
//! setting. Mutations require the registry administrator as caller; reads
//! are open to any authenticated caller.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use mediate_core::{Address, Category, MediatorId};
use mediate_registry::{Mediator, NewMediator};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::CallerIdentity;
use crate::db::WriteSet;
use crate::error::AppError;
use crate::extractors::{check_len, extract_validated_json, Validate};
use crate::state::AppState;

const MAX_TEXT_LEN: usize = 256;

// -- DTOs ---------------------------------------------------------------------

/// A registered mediator (API-layer representation).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MediatorRecord {
    pub id: u64,
    pub owner: String,
    pub category: u32,
    pub time_zone: String,
    pub languages: String,
    pub certifications: String,
    pub dao_experience: bool,
    pub is_available: bool,
    pub is_active: bool,
    pub open_case_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Mediator> for MediatorRecord {
    fn from(m: &Mediator) -> Self {
        Self {
            id: m.id.get(),
            owner: m.owner.to_string(),
            category: m.category.0,
            time_zone: m.time_zone.clone(),
            languages: m.languages.clone(),
            certifications: m.certifications.clone(),
            dao_experience: m.dao_experience,
            is_available: m.is_available,
            is_active: m.is_active,
            open_case_count: m.open_case_count,
            created_at: *m.timestamp.as_datetime(),
        }
    }
}

/// Request to register a mediator.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMediatorRequest {
    /// Account operating the mediator (`0x` + 40 hex digits, non-zero).
    pub owner: String,
    pub time_zone: String,
    pub languages: String,
    pub certifications: String,
    pub dao_experience: bool,
    pub category: u32,
}

impl Validate for CreateMediatorRequest {
    fn validate(&self) -> Result<(), String> {
        check_address("owner", &self.owner)?;
        check_len("time_zone", &self.time_zone, MAX_TEXT_LEN)?;
        check_len("languages", &self.languages, MAX_TEXT_LEN)?;
        check_len("certifications", &self.certifications, MAX_TEXT_LEN)?;
        Ok(())
    }
}

/// Optional category filter for the mediator listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryFilter {
    /// Restrict to mediators in this category.
    pub category: Option<u32>,
}

/// Availability and activity flags of a mediator.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MediatorStatus {
    pub id: u64,
    pub is_available: bool,
    pub is_active: bool,
}

/// Request to change a mediator's flags. Omitted fields are left as is.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub is_available: Option<bool>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateStatusRequest {
    fn validate(&self) -> Result<(), String> {
        if self.is_available.is_none() && self.is_active.is_none() {
            return Err("at least one of is_available or is_active is required".to_string());
        }
        Ok(())
    }
}

/// The ledger identity the registry trusts for load changes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LedgerSetting {
    pub ledger: String,
}

impl Validate for LedgerSetting {
    fn validate(&self) -> Result<(), String> {
        check_address("ledger", &self.ledger)
    }
}

/// Require a well-formed, non-zero address.
pub(crate) fn check_address(field: &str, raw: &str) -> Result<(), String> {
    let address = Address::new(raw).map_err(|e| format!("{field}: {e}"))?;
    if address.is_zero() {
        return Err(format!("{field} must not be the zero address"));
    }
    Ok(())
}

// -- Router -------------------------------------------------------------------

/// Build the mediator registry router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/mediators", get(list_mediators).post(create_mediator))
        .route("/v1/mediators/{id}", get(get_mediator))
        .route(
            "/v1/mediators/{id}/status",
            get(get_mediator_status).put(update_mediator_status),
        )
        .route("/v1/registry/ledger", put(set_mediation_ledger))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/mediators — Register a mediator.
#[utoipa::path(
    post,
    path = "/v1/mediators",
    request_body = CreateMediatorRequest,
    responses(
        (status = 201, description = "Mediator registered", body = MediatorRecord),
        (status = 403, description = "Caller is not the administrator", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid owner or field", body = crate::error::ErrorBody),
    ),
    tag = "mediators"
)]
pub async fn create_mediator(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateMediatorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MediatorRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let owner = Address::new(&req.owner)?;

    let mediator = state
        .commit(move |engine| {
            let id = engine
                .registry_admin(&caller.address)?
                .create_mediator(NewMediator {
                    owner,
                    time_zone: req.time_zone,
                    languages: req.languages,
                    certifications: req.certifications,
                    dao_experience: req.dao_experience,
                    category: Category(req.category),
                })?;
            let mediator = engine.registry().get_mediator(id)?.clone();
            Ok((mediator.clone(), WriteSet::new().with_mediator(mediator)))
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MediatorRecord::from(&mediator))))
}

/// GET /v1/mediators — Owner addresses of all mediators, in creation order.
///
/// With `?category=N`, only mediators in that category.
#[utoipa::path(
    get,
    path = "/v1/mediators",
    params(CategoryFilter),
    responses(
        (status = 200, description = "Owner addresses", body = Vec<String>),
    ),
    tag = "mediators"
)]
pub async fn list_mediators(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> Json<Vec<String>> {
    let engine = state.engine.lock();
    let registry = engine.registry();
    let owners = match filter.category {
        Some(category) => registry.mediators_by_category(Category(category)),
        None => registry.all_mediators(),
    };
    Json(owners.iter().map(Address::to_string).collect())
}

/// GET /v1/mediators/{id} — Full mediator record.
#[utoipa::path(
    get,
    path = "/v1/mediators/{id}",
    params(("id" = u64, Path, description = "Mediator ID")),
    responses(
        (status = 200, description = "Mediator found", body = MediatorRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "mediators"
)]
pub async fn get_mediator(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MediatorRecord>, AppError> {
    let engine = state.engine.lock();
    let mediator = engine.registry().get_mediator(MediatorId(id))?;
    Ok(Json(MediatorRecord::from(mediator)))
}

/// GET /v1/mediators/{id}/status — Availability and activity flags.
#[utoipa::path(
    get,
    path = "/v1/mediators/{id}/status",
    params(("id" = u64, Path, description = "Mediator ID")),
    responses(
        (status = 200, description = "Current flags", body = MediatorStatus),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "mediators"
)]
pub async fn get_mediator_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MediatorStatus>, AppError> {
    let engine = state.engine.lock();
    let registry = engine.registry();
    let id = MediatorId(id);
    Ok(Json(MediatorStatus {
        id: id.get(),
        is_available: registry.is_available(id)?,
        is_active: registry.is_active(id)?,
    }))
}

/// PUT /v1/mediators/{id}/status — Change availability and/or activity.
#[utoipa::path(
    put,
    path = "/v1/mediators/{id}/status",
    params(("id" = u64, Path, description = "Mediator ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Flags updated", body = MediatorStatus),
        (status = 403, description = "Caller is not the administrator", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "mediators"
)]
pub async fn update_mediator_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<u64>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MediatorStatus>, AppError> {
    let req = extract_validated_json(body)?;
    let id = MediatorId(id);

    let mediator = state
        .commit(move |engine| {
            // Resolve the id first so an unknown mediator leaves no partial update.
            engine.registry().get_mediator(id)?;
            let mut admin = engine.registry_admin(&caller.address)?;
            if let Some(is_available) = req.is_available {
                admin.set_availability(id, is_available)?;
            }
            if let Some(is_active) = req.is_active {
                admin.set_active(id, is_active)?;
            }
            let mediator = engine.registry().get_mediator(id)?.clone();
            Ok((mediator.clone(), WriteSet::new().with_mediator(mediator)))
        })
        .await?;

    Ok(Json(MediatorStatus {
        id: mediator.id.get(),
        is_available: mediator.is_available,
        is_active: mediator.is_active,
    }))
}

/// PUT /v1/registry/ledger — Set the ledger identity trusted for load changes.
#[utoipa::path(
    put,
    path = "/v1/registry/ledger",
    request_body = LedgerSetting,
    responses(
        (status = 200, description = "Trusted ledger updated", body = LedgerSetting),
        (status = 403, description = "Caller is not the administrator", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid address", body = crate::error::ErrorBody),
    ),
    tag = "mediators"
)]
pub async fn set_mediation_ledger(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<LedgerSetting>, JsonRejection>,
) -> Result<Json<LedgerSetting>, AppError> {
    let req = extract_validated_json(body)?;
    let ledger = Address::new(&req.ledger)?;

    let trusted = ledger.clone();
    state
        .commit(move |engine| {
            engine
                .registry_admin(&caller.address)?
                .set_mediation_ledger(trusted.clone());
            Ok(((), WriteSet::new().with_trusted_ledger(trusted)))
        })
        .await?;

    Ok(Json(LedgerSetting {
        ledger: ledger.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x00000000000000000000000000000000000000a0";

    #[test]
    fn ledger_setting_requires_real_address() {
        assert!(LedgerSetting { ledger: ADDR.into() }.validate().is_ok());
        assert!(LedgerSetting { ledger: "0x1234".into() }.validate().is_err());
        let zero = LedgerSetting {
            ledger: Address::zero().to_string(),
        };
        assert!(zero.validate().unwrap_err().contains("zero"));
    }

    #[test]
    fn create_request_checks_owner_and_lengths() {
        let request = |owner: &str, languages: String| CreateMediatorRequest {
            owner: owner.to_string(),
            time_zone: "UTC".into(),
            languages,
            certifications: String::new(),
            dao_experience: false,
            category: 0,
        };
        assert!(request(ADDR, "en".into()).validate().is_ok());
        assert!(request("not-an-address", "en".into()).validate().is_err());
        assert!(request(ADDR, "x".repeat(MAX_TEXT_LEN + 1)).validate().is_err());
    }
}
