//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx. When a database URL is
//! configured, every successful mutation upserts the records it touched
//! (write-through) and the engine is rebuilt from the tables on startup.
//! Without one, the service runs in-memory only.
//!
//! The in-memory engine stays authoritative while the process runs; the
//! tables are a durable copy of its records, not a second source of truth.
//! Event logs are not persisted.
//!
//! Every mutation hands its touched records to a [`RecordStore`] as one
//! [`WriteSet`]. [`PgStore`] applies a write set inside a single
//! transaction, so a mediator's load and the case that changed it land
//! together or not at all.

pub mod cases;
pub mod mediators;
pub mod memory;
pub mod settings;

use async_trait::async_trait;
use mediate_core::Address;
use mediate_ledger::Case;
use mediate_registry::Mediator;
use sqlx::postgres::{PgPool, PgPoolOptions};

pub use memory::MemoryStore;

/// Records touched by one mutation, written as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    pub mediators: Vec<Mediator>,
    pub cases: Vec<Case>,
    pub trusted_ledger: Option<Address>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mediator(mut self, mediator: Mediator) -> Self {
        self.mediators.push(mediator);
        self
    }

    pub fn with_case(mut self, case: Case) -> Self {
        self.cases.push(case);
        self
    }

    pub fn with_trusted_ledger(mut self, ledger: Address) -> Self {
        self.trusted_ledger = Some(ledger);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mediators.is_empty() && self.cases.is_empty() && self.trusted_ledger.is_none()
    }
}

/// Everything needed to rebuild the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredState {
    pub mediators: Vec<Mediator>,
    pub cases: Vec<Case>,
    pub trusted_ledger: Option<Address>,
}

/// Durable backing for the engine's records.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Write every record in `writes`, all or nothing.
    async fn apply(&self, writes: &WriteSet) -> Result<(), sqlx::Error>;

    /// Read back every stored record.
    async fn load(&self) -> Result<StoredState, sqlx::Error>;
}

/// Postgres-backed record store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn apply(&self, writes: &WriteSet) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for mediator in &writes.mediators {
            mediators::upsert(&mut *tx, mediator).await?;
        }
        for case in &writes.cases {
            cases::upsert(&mut *tx, case).await?;
        }
        if let Some(ledger) = &writes.trusted_ledger {
            settings::store_trusted_ledger(&mut *tx, ledger).await?;
        }
        tx.commit().await
    }

    async fn load(&self) -> Result<StoredState, sqlx::Error> {
        Ok(StoredState {
            mediators: mediators::load_all(&self.pool).await?,
            cases: cases::load_all(&self.pool).await?,
            trusted_ledger: settings::load_trusted_ledger(&self.pool).await?,
        })
    }
}

/// Initialize the connection pool and run embedded migrations.
///
/// Returns `None` when `database_url` is absent (in-memory-only mode).
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Convert an unsigned id or counter to the signed column type.
pub(crate) fn to_i64(value: u64, column: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(value)
        .map_err(|_| sqlx::Error::Protocol(format!("{column} value {value} exceeds BIGINT")))
}

/// Convert a signed column back to an unsigned id or counter.
pub(crate) fn to_u64(value: i64, column: &str) -> Result<u64, sqlx::Error> {
    u64::try_from(value)
        .map_err(|_| sqlx::Error::Protocol(format!("negative {column} value {value} in database")))
}

/// Map a domain decoding failure onto a SQLx error.
pub(crate) fn decode_err(column: &str, err: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Protocol(format!("invalid {column} in database: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_column_conversions() {
        assert_eq!(to_i64(7, "id").unwrap(), 7);
        assert!(to_i64(u64::MAX, "id").is_err());
        assert_eq!(to_u64(7, "id").unwrap(), 7);
        assert!(to_u64(-1, "id").is_err());
    }

    #[test]
    fn write_set_builder() {
        assert!(WriteSet::new().is_empty());
        let writes = WriteSet::new().with_trusted_ledger(Address::from_low_u64(1));
        assert!(!writes.is_empty());
        assert!(writes.mediators.is_empty());
    }

    #[tokio::test]
    async fn no_url_means_in_memory() {
        assert!(init_pool(None).await.unwrap().is_none());
    }
}
