//! # Ledger Events

use mediate_core::{Address, Amount, CaseId, Category, MediatorId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::case::PartySide;

/// A case ledger mutation, as seen by external observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A case was opened by a party or on behalf of two parties.
    CaseCreated {
        case_id: CaseId,
        category: Category,
        first_party: Address,
        second_party: Option<Address>,
        /// Account that supplied the opening deposit.
        depositor: Address,
        deposit: Amount,
        timestamp: Timestamp,
    },
    SecondPartyJoined {
        case_id: CaseId,
        second_party: Address,
        deposit: Amount,
        timestamp: Timestamp,
    },
    MemberJoined {
        case_id: CaseId,
        side: PartySide,
        member: Address,
        timestamp: Timestamp,
    },
    MediatorAssigned {
        case_id: CaseId,
        mediator_id: MediatorId,
        timestamp: Timestamp,
    },
    CaseClosed {
        case_id: CaseId,
        /// Mediator whose load was released, if one was assigned.
        mediator_id: Option<MediatorId>,
        timestamp: Timestamp,
    },
}

impl LedgerEvent {
    /// The case this event concerns.
    pub fn case_id(&self) -> CaseId {
        match self {
            Self::CaseCreated { case_id, .. }
            | Self::SecondPartyJoined { case_id, .. }
            | Self::MemberJoined { case_id, .. }
            | Self::MediatorAssigned { case_id, .. }
            | Self::CaseClosed { case_id, .. } => *case_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_joined_serializes_side_by_name() {
        let event = LedgerEvent::MemberJoined {
            case_id: CaseId(4),
            side: PartySide::Second,
            member: Address::from_low_u64(5),
            timestamp: Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "member_joined");
        assert_eq!(json["side"], "second");
        assert_eq!(json["case_id"], 4);
        assert_eq!(event.case_id(), CaseId(4));
    }

    #[test]
    fn deposits_serialize_as_base_unit_strings() {
        let event = LedgerEvent::SecondPartyJoined {
            case_id: CaseId(1),
            second_party: Address::from_low_u64(2),
            deposit: Amount::from_base_units(1_500_000_000_000_000),
            timestamp: Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["deposit"], "1500000000000000");
    }
}
