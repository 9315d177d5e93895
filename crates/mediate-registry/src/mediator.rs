//! # Mediator Records

use mediate_core::{Address, Category, MediatorId, Timestamp};
use serde::{Deserialize, Serialize};

/// Registration request for a new mediator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMediator {
    /// Account that operates the mediator.
    pub owner: Address,
    /// Free-form time zone description (e.g. `"GMT + 1"`).
    pub time_zone: String,
    /// Free-form list of spoken languages.
    pub languages: String,
    /// Free-form certifications.
    pub certifications: String,
    /// Whether the mediator has prior DAO experience.
    pub dao_experience: bool,
    /// Domain the mediator arbitrates in.
    pub category: Category,
}

/// A registered mediator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mediator {
    pub id: MediatorId,
    pub owner: Address,
    pub category: Category,
    pub time_zone: String,
    pub languages: String,
    pub certifications: String,
    pub dao_experience: bool,
    pub is_available: bool,
    pub is_active: bool,
    /// Number of open cases currently assigned.
    pub open_case_count: u64,
    /// Registration time. Immutable.
    pub timestamp: Timestamp,
}

impl Mediator {
    /// Build a freshly registered mediator: available, active, no cases.
    pub(crate) fn register(id: MediatorId, new: NewMediator, timestamp: Timestamp) -> Self {
        Self {
            id,
            owner: new.owner,
            category: new.category,
            time_zone: new.time_zone,
            languages: new.languages,
            certifications: new.certifications,
            dao_experience: new.dao_experience,
            is_available: true,
            is_active: true,
            open_case_count: 0,
            timestamp,
        }
    }

    /// Whether random selection may pick this mediator.
    pub fn is_eligible(&self) -> bool {
        self.is_available && self.is_active
    }
}
