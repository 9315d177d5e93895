//! Case persistence operations on the `cases` table.
//!
//! Membership lists and the deposit log are stored as JSONB; the escrow
//! total is stored as a base-unit string because it exceeds BIGINT.

use chrono::{DateTime, Utc};
use mediate_core::{Address, Amount, CaseId, Category, MediatorId, Timestamp};
use mediate_ledger::{Case, Deposit};
use sqlx::{PgExecutor, PgPool};

use super::{decode_err, to_i64, to_u64};

/// Insert or overwrite a case record.
pub async fn upsert<'e>(executor: impl PgExecutor<'e>, case: &Case) -> Result<(), sqlx::Error> {
    let first_members = serde_json::to_value(&case.first_party_members)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize members: {e}")))?;
    let second_members = serde_json::to_value(&case.second_party_members)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize members: {e}")))?;
    let deposits = serde_json::to_value(&case.deposits)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize deposits: {e}")))?;
    let assigned = case
        .assigned_mediator
        .map(|m| to_i64(m.get(), "cases.assigned_mediator"))
        .transpose()?;

    sqlx::query(
        "INSERT INTO cases (id, category, first_party, second_party, first_party_members,
                            second_party_members, escrowed_value, deposits, assigned_mediator,
                            case_closed, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (id) DO UPDATE SET
             second_party = EXCLUDED.second_party,
             first_party_members = EXCLUDED.first_party_members,
             second_party_members = EXCLUDED.second_party_members,
             escrowed_value = EXCLUDED.escrowed_value,
             deposits = EXCLUDED.deposits,
             assigned_mediator = EXCLUDED.assigned_mediator,
             case_closed = EXCLUDED.case_closed,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(to_i64(case.id.get(), "cases.id")?)
    .bind(i64::from(case.category.0))
    .bind(case.first_party.as_str())
    .bind(case.second_party.as_ref().map(Address::as_str))
    .bind(&first_members)
    .bind(&second_members)
    .bind(case.escrowed_value.base_units().to_string())
    .bind(&deposits)
    .bind(assigned)
    .bind(case.case_closed)
    .bind(*case.created_at.as_datetime())
    .bind(*case.updated_at.as_datetime())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load every case in id order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Case>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CaseRow>(
        "SELECT id, category, first_party, second_party, first_party_members,
                second_party_members, escrowed_value, deposits, assigned_mediator,
                case_closed, created_at, updated_at
         FROM cases ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CaseRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct CaseRow {
    id: i64,
    category: i64,
    first_party: String,
    second_party: Option<String>,
    first_party_members: serde_json::Value,
    second_party_members: serde_json::Value,
    escrowed_value: String,
    deposits: serde_json::Value,
    assigned_mediator: Option<i64>,
    case_closed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CaseRow {
    fn into_record(self) -> Result<Case, sqlx::Error> {
        let category =
            u32::try_from(self.category).map_err(|e| decode_err("cases.category", e))?;
        let second_party = self
            .second_party
            .map(|s| Address::new(s).map_err(|e| decode_err("cases.second_party", e)))
            .transpose()?;
        let assigned_mediator = self
            .assigned_mediator
            .map(|m| to_u64(m, "cases.assigned_mediator").map(MediatorId))
            .transpose()?;
        let first_party_members: Vec<Address> = serde_json::from_value(self.first_party_members)
            .map_err(|e| decode_err("cases.first_party_members", e))?;
        let second_party_members: Vec<Address> =
            serde_json::from_value(self.second_party_members)
                .map_err(|e| decode_err("cases.second_party_members", e))?;
        let deposits: Vec<Deposit> = serde_json::from_value(self.deposits)
            .map_err(|e| decode_err("cases.deposits", e))?;

        Ok(Case {
            id: CaseId(to_u64(self.id, "cases.id")?),
            category: Category(category),
            first_party: Address::new(&self.first_party)
                .map_err(|e| decode_err("cases.first_party", e))?,
            second_party,
            first_party_members,
            second_party_members,
            escrowed_value: self
                .escrowed_value
                .parse::<Amount>()
                .map_err(|e| decode_err("cases.escrowed_value", e))?,
            deposits,
            assigned_mediator,
            case_closed: self.case_closed,
            created_at: Timestamp::from_utc(self.created_at),
            updated_at: Timestamp::from_utc(self.updated_at),
        })
    }
}
