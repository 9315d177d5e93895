//! Registry settings on the `registry_settings` key/value table.

use mediate_core::Address;
use sqlx::{PgExecutor, PgPool};

use super::decode_err;

const TRUSTED_LEDGER_KEY: &str = "trusted_ledger";

/// Record the ledger identity the registry trusts for load changes.
pub async fn store_trusted_ledger<'e>(
    executor: impl PgExecutor<'e>,
    ledger: &Address,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO registry_settings (key, value) VALUES ($1, $2)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(TRUSTED_LEDGER_KEY)
    .bind(ledger.as_str())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load the stored trusted ledger, if one was ever recorded.
pub async fn load_trusted_ledger(pool: &PgPool) -> Result<Option<Address>, sqlx::Error> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM registry_settings WHERE key = $1")
            .bind(TRUSTED_LEDGER_KEY)
            .fetch_optional(pool)
            .await?;

    value
        .map(|v| Address::new(v).map_err(|e| decode_err("registry_settings.trusted_ledger", e)))
        .transpose()
}
