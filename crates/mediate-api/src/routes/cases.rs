//! # Case Ledger API
//!
//! Opening cases with an escrowed deposit, joining them, assigning a
//! mediator, and closing them.
//!
//! Amounts cross the API as decimal strings in whole units (`"0.0015"`);
//! at most 18 fractional digits are accepted.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use mediate_core::{Address, Amount, CaseId, Category, MediatorId};
use mediate_ledger::{Case, Deposit, MediationEngine, PartySide};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::db::WriteSet;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::mediators::check_address;
use crate::state::AppState;

// -- DTOs ---------------------------------------------------------------------

/// One escrowed contribution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepositRecord {
    pub party: String,
    /// Whole-unit decimal amount.
    pub amount: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Deposit> for DepositRecord {
    fn from(d: &Deposit) -> Self {
        Self {
            party: d.party.to_string(),
            amount: d.amount.to_decimal_string(),
            timestamp: *d.timestamp.as_datetime(),
        }
    }
}

/// A mediation case (API-layer representation).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseRecord {
    pub id: u64,
    pub category: u32,
    /// One of `CREATED`, `SECOND_PARTY_JOINED`, `MEDIATOR_ASSIGNED`, `CLOSED`.
    pub stage: String,
    pub first_party: String,
    pub second_party: Option<String>,
    pub first_party_members: Vec<String>,
    pub second_party_members: Vec<String>,
    /// Whole-unit decimal total held in escrow.
    pub escrowed_value: String,
    pub deposits: Vec<DepositRecord>,
    pub assigned_mediator: Option<u64>,
    pub case_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Case> for CaseRecord {
    fn from(c: &Case) -> Self {
        Self {
            id: c.id.get(),
            category: c.category.0,
            stage: c.stage().as_str().to_string(),
            first_party: c.first_party.to_string(),
            second_party: c.second_party.as_ref().map(Address::to_string),
            first_party_members: c.first_party_members.iter().map(Address::to_string).collect(),
            second_party_members: c.second_party_members.iter().map(Address::to_string).collect(),
            escrowed_value: c.escrowed_value.to_decimal_string(),
            deposits: c.deposits.iter().map(DepositRecord::from).collect(),
            assigned_mediator: c.assigned_mediator.map(|m| m.get()),
            case_closed: c.case_closed,
            created_at: *c.created_at.as_datetime(),
            updated_at: *c.updated_at.as_datetime(),
        }
    }
}

/// Request to open a case as first party.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCaseRequest {
    pub category: u32,
    /// Whole-unit decimal deposit, e.g. `"0.0015"`.
    pub deposit: String,
}

impl Validate for CreateCaseRequest {
    fn validate(&self) -> Result<(), String> {
        check_deposit(&self.deposit)
    }
}

/// Request to open a case on behalf of two named parties.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompanyCaseRequest {
    pub first_party: String,
    pub second_party: String,
    /// Whole-unit decimal deposit, credited to the caller.
    pub deposit: String,
}

impl Validate for CompanyCaseRequest {
    fn validate(&self) -> Result<(), String> {
        check_address("first_party", &self.first_party)?;
        check_address("second_party", &self.second_party)?;
        check_deposit(&self.deposit)
    }
}

/// Request carrying a deposit only.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Whole-unit decimal deposit.
    pub deposit: String,
}

impl Validate for DepositRequest {
    fn validate(&self) -> Result<(), String> {
        check_deposit(&self.deposit)
    }
}

/// Request to join a case as a group member.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// 1 joins behind the first party, 2 behind the second.
    pub side: u8,
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), String> {
        PartySide::try_from(self.side)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Request to assign a specific mediator.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequest {
    pub mediator_id: u64,
}

impl Validate for AssignRequest {
    fn validate(&self) -> Result<(), String> {
        if self.mediator_id == 0 {
            return Err("mediator_id must be positive".to_string());
        }
        Ok(())
    }
}

/// Result of an assignment: the updated case and the chosen mediator.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentRecord {
    pub mediator_id: u64,
    pub case: CaseRecord,
}

// -- Router -------------------------------------------------------------------

/// Build the case ledger router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/cases", post(create_case))
        .route("/v1/cases/company", post(company_create_case))
        .route("/v1/cases/{id}", get(get_case))
        .route("/v1/cases/{id}/second-party", post(join_as_second_party))
        .route("/v1/cases/{id}/members", post(join_case))
        .route("/v1/cases/{id}/members/first", get(first_party_members))
        .route("/v1/cases/{id}/members/second", get(second_party_members))
        .route("/v1/cases/{id}/mediator", post(assign_mediator))
        .route("/v1/cases/{id}/mediator/random", post(assign_random_mediator))
        .route("/v1/cases/{id}/close", post(close_case))
}

/// A deposit must be a positive decimal amount.
fn check_deposit(raw: &str) -> Result<(), String> {
    let amount = Amount::parse_decimal(raw).map_err(|e| e.to_string())?;
    if amount.is_zero() {
        return Err("deposit must be greater than zero".to_string());
    }
    Ok(())
}

fn parse_deposit(raw: &str) -> Result<Amount, AppError> {
    Ok(Amount::parse_decimal(raw)?)
}

/// A case and its write set.
fn case_writes(engine: &MediationEngine, case_id: CaseId) -> Result<(Case, WriteSet), AppError> {
    let case = engine.ledger().get_case(case_id)?.clone();
    Ok((case.clone(), WriteSet::new().with_case(case)))
}

/// A case, plus its assigned mediator whose load the change touched.
fn assignment_writes(
    engine: &MediationEngine,
    case_id: CaseId,
) -> Result<(Case, WriteSet), AppError> {
    let (case, mut writes) = case_writes(engine, case_id)?;
    if let Some(id) = case.assigned_mediator {
        writes.mediators.push(engine.registry().get_mediator(id)?.clone());
    }
    Ok((case, writes))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/cases — Open a case as first party with a deposit.
#[utoipa::path(
    post,
    path = "/v1/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case opened", body = CaseRecord),
        (status = 422, description = "Zero or malformed deposit", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn create_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CaseRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let deposit = parse_deposit(&req.deposit)?;

    let case = state
        .commit(move |engine| {
            let id = engine.create_case(&caller.address, Category(req.category), deposit)?;
            case_writes(engine, id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CaseRecord::from(&case))))
}

/// POST /v1/cases/company — Open a case on behalf of two parties.
#[utoipa::path(
    post,
    path = "/v1/cases/company",
    request_body = CompanyCaseRequest,
    responses(
        (status = 201, description = "Case opened with both parties", body = CaseRecord),
        (status = 422, description = "Invalid party or deposit", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn company_create_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CompanyCaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CaseRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let first_party = Address::new(&req.first_party)?;
    let second_party = Address::new(&req.second_party)?;
    let deposit = parse_deposit(&req.deposit)?;

    let case = state
        .commit(move |engine| {
            let id =
                engine.company_create_case(&caller.address, first_party, second_party, deposit)?;
            case_writes(engine, id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CaseRecord::from(&case))))
}

/// GET /v1/cases/{id} — Full case record.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}",
    params(("id" = u64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case found", body = CaseRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CaseRecord>, AppError> {
    let engine = state.engine.lock();
    let case = engine.ledger().get_case(CaseId(id))?;
    Ok(Json(CaseRecord::from(case)))
}

/// POST /v1/cases/{id}/second-party — Join as second party with a deposit.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/second-party",
    params(("id" = u64, Path, description = "Case ID")),
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Second party joined", body = CaseRecord),
        (status = 409, description = "Case does not exist or is not joinable", body = crate::error::ErrorBody),
        (status = 422, description = "Zero or malformed deposit", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn join_as_second_party(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<u64>,
    body: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<Json<CaseRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let deposit = parse_deposit(&req.deposit)?;
    let case_id = CaseId(id);

    let case = state
        .commit(move |engine| {
            engine.join_case_as_second_party(&caller.address, case_id, deposit)?;
            case_writes(engine, case_id)
        })
        .await?;

    Ok(Json(CaseRecord::from(&case)))
}

/// POST /v1/cases/{id}/members — Join as a group member behind a principal.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/members",
    params(("id" = u64, Path, description = "Case ID")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Member added", body = CaseRecord),
        (status = 409, description = "Case missing or closed, or that principal has not joined", body = crate::error::ErrorBody),
        (status = 422, description = "Side is not 1 or 2", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn join_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<u64>,
    body: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<CaseRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let case_id = CaseId(id);

    let case = state
        .commit(move |engine| {
            engine.join_case(&caller.address, case_id, req.side)?;
            case_writes(engine, case_id)
        })
        .await?;

    Ok(Json(CaseRecord::from(&case)))
}

/// GET /v1/cases/{id}/members/first — Members behind the first party.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}/members/first",
    params(("id" = u64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Member addresses in join order", body = Vec<String>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn first_party_members(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<String>>, AppError> {
    let engine = state.engine.lock();
    let members = engine.ledger().first_party_members(CaseId(id))?;
    Ok(Json(members.iter().map(Address::to_string).collect()))
}

/// GET /v1/cases/{id}/members/second — Members behind the second party.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}/members/second",
    params(("id" = u64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Member addresses in join order", body = Vec<String>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn second_party_members(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<String>>, AppError> {
    let engine = state.engine.lock();
    let members = engine.ledger().second_party_members(CaseId(id))?;
    Ok(Json(members.iter().map(Address::to_string).collect()))
}

/// POST /v1/cases/{id}/mediator — Assign a specific mediator.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/mediator",
    params(("id" = u64, Path, description = "Case ID")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Mediator assigned", body = AssignmentRecord),
        (status = 404, description = "Case or mediator not found", body = crate::error::ErrorBody),
        (status = 409, description = "Case already has a mediator or is closed", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn assign_mediator(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<Json<AssignmentRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let case_id = CaseId(id);
    let mediator_id = MediatorId(req.mediator_id);

    let case = state
        .commit(move |engine| {
            engine.assign_mediator(mediator_id, case_id)?;
            assignment_writes(engine, case_id)
        })
        .await?;

    Ok(Json(AssignmentRecord {
        mediator_id: mediator_id.get(),
        case: CaseRecord::from(&case),
    }))
}

/// POST /v1/cases/{id}/mediator/random — Assign a randomly drawn mediator.
///
/// The pool is every available, active mediator in the case's category.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/mediator/random",
    params(("id" = u64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Mediator assigned", body = AssignmentRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "No eligible mediator, or case not assignable", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn assign_random_mediator(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<AssignmentRecord>, AppError> {
    let case_id = CaseId(id);

    let (mediator_id, case) = state
        .commit(move |engine| {
            let mediator_id = engine.assign_random_mediator(case_id, &mut rand::thread_rng())?;
            let (case, writes) = assignment_writes(engine, case_id)?;
            Ok(((mediator_id, case), writes))
        })
        .await?;

    Ok(Json(AssignmentRecord {
        mediator_id: mediator_id.get(),
        case: CaseRecord::from(&case),
    }))
}

/// POST /v1/cases/{id}/close — Close a case (administrator only).
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/close",
    params(("id" = u64, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case closed", body = CaseRecord),
        (status = 403, description = "Caller is not the administrator", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already closed", body = crate::error::ErrorBody),
    ),
    tag = "cases"
)]
pub async fn close_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<u64>,
) -> Result<Json<CaseRecord>, AppError> {
    let case_id = CaseId(id);

    let case = state
        .commit(move |engine| {
            engine.close_case(&caller.address, case_id)?;
            assignment_writes(engine, case_id)
        })
        .await?;

    Ok(Json(CaseRecord::from(&case)))
}
