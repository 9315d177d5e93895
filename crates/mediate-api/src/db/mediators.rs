//! Mediator persistence operations on the `mediators` table.

use chrono::{DateTime, Utc};
use mediate_core::{Address, Category, MediatorId, Timestamp};
use mediate_registry::Mediator;
use sqlx::{PgExecutor, PgPool};

use super::{decode_err, to_i64, to_u64};

/// Insert or overwrite a mediator record.
pub async fn upsert<'e>(executor: impl PgExecutor<'e>, mediator: &Mediator) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO mediators (id, owner, category, time_zone, languages, certifications,
                                dao_experience, is_available, is_active, open_case_count, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (id) DO UPDATE SET
             is_available = EXCLUDED.is_available,
             is_active = EXCLUDED.is_active,
             open_case_count = EXCLUDED.open_case_count",
    )
    .bind(to_i64(mediator.id.get(), "mediators.id")?)
    .bind(mediator.owner.as_str())
    .bind(i64::from(mediator.category.0))
    .bind(&mediator.time_zone)
    .bind(&mediator.languages)
    .bind(&mediator.certifications)
    .bind(mediator.dao_experience)
    .bind(mediator.is_available)
    .bind(mediator.is_active)
    .bind(to_i64(mediator.open_case_count, "mediators.open_case_count")?)
    .bind(*mediator.timestamp.as_datetime())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load every mediator in id order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Mediator>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MediatorRow>(
        "SELECT id, owner, category, time_zone, languages, certifications,
                dao_experience, is_available, is_active, open_case_count, created_at
         FROM mediators ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MediatorRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct MediatorRow {
    id: i64,
    owner: String,
    category: i64,
    time_zone: String,
    languages: String,
    certifications: String,
    dao_experience: bool,
    is_available: bool,
    is_active: bool,
    open_case_count: i64,
    created_at: DateTime<Utc>,
}

impl MediatorRow {
    fn into_record(self) -> Result<Mediator, sqlx::Error> {
        let category = u32::try_from(self.category)
            .map_err(|e| decode_err("mediators.category", e))?;
        Ok(Mediator {
            id: MediatorId(to_u64(self.id, "mediators.id")?),
            owner: Address::new(&self.owner).map_err(|e| decode_err("mediators.owner", e))?,
            category: Category(category),
            time_zone: self.time_zone,
            languages: self.languages,
            certifications: self.certifications,
            dao_experience: self.dao_experience,
            is_available: self.is_available,
            is_active: self.is_active,
            open_case_count: to_u64(self.open_case_count, "mediators.open_case_count")?,
            timestamp: Timestamp::from_utc(self.created_at),
        })
    }
}
