//! # Application State
//!
//! Shared state for the Axum application, passed to route handlers via the
//! `State` extractor.
//!
//! The [`MediationEngine`] is the single authoritative state machine. It
//! sits behind one `parking_lot::Mutex`, so every request observes either
//! all or none of another request's effects. Readers take the lock in a
//! scoped block, copy out what they need, and release it before any
//! `.await` (the guard is not `Send`).
//!
//! Mutations go through [`AppState::commit`]. A `tokio::sync::Mutex` gate
//! is held from the engine change until its records are durable, so write
//! sets reach the store in the order the engine produced them. If the
//! store rejects a write set, the engine is put back to its state before
//! the mutation.

use std::sync::Arc;

use mediate_core::Address;
use mediate_ledger::MediationEngine;
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::db::{PgStore, RecordStore, WriteSet};
use crate::error::AppError;

/// Identity the ledger presents to the registry when none is configured.
pub const DEFAULT_LEDGER_ADDRESS: &str = "0x0000000000000000000000000000000000000001";

/// Application configuration.
///
/// Custom `Debug` redacts the auth token and database URL.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, callers only name their address.
    pub auth_token: Option<String>,
    /// Administrator of both the registry and the ledger.
    pub administrator: Address,
    /// Identity the ledger presents to the registry.
    pub ledger_address: Address,
    /// Postgres connection string. If `None`, state is in-memory only.
    pub database_url: Option<String>,
}

impl AppConfig {
    /// Configuration with defaults for everything but the administrator.
    pub fn new(administrator: Address) -> Self {
        Self {
            port: 8080,
            auth_token: None,
            administrator,
            ledger_address: Address::from_low_u64(1),
            database_url: None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("administrator", &self.administrator)
            .field("ledger_address", &self.ledger_address)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<Mutex<MediationEngine>>,
    /// Write-through record store. `None` means in-memory only.
    pub store: Option<Arc<dyn RecordStore>>,
    /// Held by a mutation until its write set is durable.
    writer: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    /// In-memory state with a freshly deployed engine.
    pub fn new(config: AppConfig) -> Self {
        Self::build(config, None)
    }

    /// State persisted to Postgres when a pool is given.
    pub fn with_pool(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let store = db_pool.map(|pool| Arc::new(PgStore::new(pool)) as Arc<dyn RecordStore>);
        Self::build(config, store)
    }

    /// State persisted to an arbitrary record store.
    pub fn with_store(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        Self::build(config, Some(store))
    }

    fn build(config: AppConfig, store: Option<Arc<dyn RecordStore>>) -> Self {
        let engine = MediationEngine::new(
            config.administrator.clone(),
            config.ledger_address.clone(),
        );
        Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
            store,
            writer: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Run one mutation against the engine and persist the records it
    /// reports as touched.
    ///
    /// `op` runs under the engine lock and returns its result together
    /// with the write set. Mutations are serialized until their write set
    /// is stored. When the store fails, the engine is restored to its
    /// state before `op` and an internal error is returned.
    pub async fn commit<T, F>(&self, op: F) -> Result<T, AppError>
    where
        T: Send,
        F: FnOnce(&mut MediationEngine) -> Result<(T, WriteSet), AppError> + Send,
    {
        let _gate = self.writer.lock().await;

        let (output, writes, before) = {
            let mut engine = self.engine.lock();
            let before = self.store.as_ref().map(|_| (*engine).clone());
            let (output, writes) = op(&mut *engine)?;
            (output, writes, before)
        };

        let (store, before) = match (&self.store, before) {
            (Some(store), Some(before)) if !writes.is_empty() => (store, before),
            _ => return Ok(output),
        };

        if let Err(e) = store.apply(&writes).await {
            tracing::error!(
                error = %e,
                mediators = writes.mediators.len(),
                cases = writes.cases.len(),
                "write-through failed; rolling back in-memory change"
            );
            *self.engine.lock() = before;
            return Err(AppError::Internal(format!("failed to persist change: {e}")));
        }
        Ok(output)
    }

    /// Rebuild the engine from the record store, if one is configured.
    ///
    /// A store without a trusted ledger is treated as fresh: the
    /// configured ledger address is recorded and trusted.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let store = match &self.store {
            Some(store) => store,
            None => return Ok(()),
        };
        let _gate = self.writer.lock().await;

        let stored = store
            .load()
            .await
            .map_err(|e| format!("failed to load stored state: {e}"))?;
        let trusted_ledger = match stored.trusted_ledger {
            Some(ledger) => ledger,
            None => {
                let ledger = self.config.ledger_address.clone();
                store
                    .apply(&WriteSet::new().with_trusted_ledger(ledger.clone()))
                    .await
                    .map_err(|e| format!("failed to record trusted ledger: {e}"))?;
                ledger
            }
        };

        let mediator_count = stored.mediators.len();
        let case_count = stored.cases.len();
        let engine = MediationEngine::restore(
            self.config.administrator.clone(),
            self.config.ledger_address.clone(),
            Some(trusted_ledger),
            stored.mediators,
            stored.cases,
        )
        .map_err(|e| format!("stored state is inconsistent: {e}"))?;
        *self.engine.lock() = engine;

        tracing::info!(
            mediators = mediator_count,
            cases = case_count,
            "Hydrated mediation engine from database"
        );
        Ok(())
    }
}
