//! In-process record store.
//!
//! Keeps rows keyed by id the way the tables do, and journals every
//! applied write set in order. Used to run the service with write-through
//! semantics but no database, and to inspect what a mutation persisted.

use std::collections::BTreeMap;

use async_trait::async_trait;
use mediate_core::Address;
use mediate_ledger::Case;
use mediate_registry::Mediator;
use parking_lot::Mutex;

use super::{RecordStore, StoredState, WriteSet};

#[derive(Debug, Default)]
struct Tables {
    mediators: BTreeMap<u64, Mediator>,
    cases: BTreeMap<u64, Case>,
    trusted_ledger: Option<Address>,
    journal: Vec<WriteSet>,
    pending_failures: usize,
}

/// Record store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `apply` fail without writing.
    pub fn fail_next_writes(&self, count: usize) {
        self.tables.lock().pending_failures = count;
    }

    /// Every successfully applied write set, oldest first.
    pub fn journal(&self) -> Vec<WriteSet> {
        self.tables.lock().journal.clone()
    }

    /// Current contents, ordered by id.
    pub fn snapshot(&self) -> StoredState {
        let tables = self.tables.lock();
        StoredState {
            mediators: tables.mediators.values().cloned().collect(),
            cases: tables.cases.values().cloned().collect(),
            trusted_ledger: tables.trusted_ledger.clone(),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn apply(&self, writes: &WriteSet) -> Result<(), sqlx::Error> {
        // Give other tasks a chance to run, as a network round trip would.
        tokio::task::yield_now().await;

        let mut tables = self.tables.lock();
        if tables.pending_failures > 0 {
            tables.pending_failures -= 1;
            return Err(sqlx::Error::Protocol("injected write failure".to_string()));
        }
        for mediator in &writes.mediators {
            tables.mediators.insert(mediator.id.get(), mediator.clone());
        }
        for case in &writes.cases {
            tables.cases.insert(case.id.get(), case.clone());
        }
        if let Some(ledger) = &writes.trusted_ledger {
            tables.trusted_ledger = Some(ledger.clone());
        }
        tables.journal.push(writes.clone());
        Ok(())
    }

    async fn load(&self) -> Result<StoredState, sqlx::Error> {
        Ok(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn applies_and_journals() {
        let store = MemoryStore::new();
        let ledger = Address::from_low_u64(1);
        store
            .apply(&WriteSet::new().with_trusted_ledger(ledger.clone()))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.trusted_ledger, Some(ledger));
        assert!(loaded.mediators.is_empty());
        assert_eq!(store.journal().len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_write_nothing() {
        let store = MemoryStore::new();
        store.fail_next_writes(1);
        let writes = WriteSet::new().with_trusted_ledger(Address::from_low_u64(1));

        assert!(store.apply(&writes).await.is_err());
        assert_eq!(store.snapshot(), StoredState::default());
        assert!(store.journal().is_empty());

        store.apply(&writes).await.unwrap();
        assert_eq!(store.journal().len(), 1);
    }
}
