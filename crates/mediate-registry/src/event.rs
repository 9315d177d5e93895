//! # Registry Events
//!
//! Structured notifications emitted by every successful registry mutation.
//! Each event is a full snapshot of the fields it reports, so observers can
//! assert against it without re-reading the registry.

use mediate_core::{Address, Category, MediatorId, Timestamp};
use serde::{Deserialize, Serialize};

/// A registry mutation, as seen by external observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A mediator was registered.
    MediatorCreated {
        id: MediatorId,
        owner: Address,
        category: Category,
        time_zone: String,
        languages: String,
        certifications: String,
        dao_experience: bool,
        timestamp: Timestamp,
    },
    /// The trusted mediation ledger was (re)configured.
    MediationLedgerSet {
        ledger: Address,
        timestamp: Timestamp,
    },
    /// A mediator's availability flag changed.
    AvailabilityChanged {
        id: MediatorId,
        is_available: bool,
        timestamp: Timestamp,
    },
    /// A mediator's activity flag changed.
    ActivityChanged {
        id: MediatorId,
        is_active: bool,
        timestamp: Timestamp,
    },
    /// A mediator's open-case counter changed.
    CaseCountChanged {
        id: MediatorId,
        open_case_count: u64,
        timestamp: Timestamp,
    },
}
