//! # Case Records
//!
//! A case moves through a small, forward-only lifecycle. The stage is not
//! stored; it is derived from the record's fields so it can never disagree
//! with them.

use mediate_core::{Address, Amount, CaseId, Category, MediatorId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Which principal a group member joins behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartySide {
    First,
    Second,
}

impl PartySide {
    /// Wire code of the side: 1 or 2.
    pub fn code(&self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl TryFrom<u8> for PartySide {
    type Error = LedgerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            other => Err(LedgerError::InvalidParty(format!(
                "side must be 1 or 2, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for PartySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// Lifecycle stage of a case, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStage {
    /// Opened by the first party; awaiting the second.
    Created,
    /// Both principals are set.
    SecondPartyJoined,
    /// A mediator holds the case.
    MediatorAssigned,
    /// No further joins or assignments. Terminal.
    Closed,
}

impl CaseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::SecondPartyJoined => "SECOND_PARTY_JOINED",
            Self::MediatorAssigned => "MEDIATOR_ASSIGNED",
            Self::Closed => "CLOSED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for CaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One escrowed contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub party: Address,
    pub amount: Amount,
    pub timestamp: Timestamp,
}

/// A mediation case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub category: Category,
    pub first_party: Address,
    /// Set at most once.
    pub second_party: Option<Address>,
    /// Group members behind the first party, in join order.
    pub first_party_members: Vec<Address>,
    /// Group members behind the second party, in join order.
    pub second_party_members: Vec<Address>,
    /// Sum of every entry in `deposits`.
    pub escrowed_value: Amount,
    pub deposits: Vec<Deposit>,
    pub assigned_mediator: Option<MediatorId>,
    pub case_closed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Case {
    /// Open a case with the given principals and no escrow yet.
    pub(crate) fn open(
        id: CaseId,
        category: Category,
        first_party: Address,
        second_party: Option<Address>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            category,
            first_party,
            second_party,
            first_party_members: Vec::new(),
            second_party_members: Vec::new(),
            escrowed_value: Amount::ZERO,
            deposits: Vec::new(),
            assigned_mediator: None,
            case_closed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> CaseStage {
        if self.case_closed {
            CaseStage::Closed
        } else if self.assigned_mediator.is_some() {
            CaseStage::MediatorAssigned
        } else if self.second_party.is_some() {
            CaseStage::SecondPartyJoined
        } else {
            CaseStage::Created
        }
    }

    /// Principal on the given side, if set.
    pub fn principal(&self, side: PartySide) -> Option<&Address> {
        match side {
            PartySide::First => Some(&self.first_party),
            PartySide::Second => self.second_party.as_ref(),
        }
    }

    /// Group members on the given side, in join order.
    pub fn members(&self, side: PartySide) -> &[Address] {
        match side {
            PartySide::First => &self.first_party_members,
            PartySide::Second => &self.second_party_members,
        }
    }

    pub(crate) fn members_mut(&mut self, side: PartySide) -> &mut Vec<Address> {
        match side {
            PartySide::First => &mut self.first_party_members,
            PartySide::Second => &mut self.second_party_members,
        }
    }

    /// The escrow after adding `amount`, or the reason it cannot be taken.
    pub(crate) fn escrow_after(&self, amount: Amount) -> Result<Amount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidDeposit {
                amount,
                reason: "deposit must be positive",
            });
        }
        self.escrowed_value
            .checked_add(amount)
            .ok_or(LedgerError::InvalidDeposit {
                amount,
                reason: "escrow would overflow",
            })
    }

    /// Record a deposit whose total was already computed by `escrow_after`.
    pub(crate) fn take_deposit(&mut self, party: Address, amount: Amount, total: Amount) {
        let now = Timestamp::now();
        self.escrowed_value = total;
        self.deposits.push(Deposit {
            party,
            amount,
            timestamp: now,
        });
        self.updated_at = now;
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> Case {
        Case::open(CaseId(1), Category(0), Address::from_low_u64(1), None)
    }

    #[test]
    fn side_codes() {
        assert_eq!(PartySide::try_from(1).unwrap(), PartySide::First);
        assert_eq!(PartySide::try_from(2).unwrap(), PartySide::Second);
        assert_eq!(PartySide::Second.code(), 2);
        for bad in [0u8, 3, 255] {
            assert!(matches!(
                PartySide::try_from(bad),
                Err(LedgerError::InvalidParty(_))
            ));
        }
    }

    #[test]
    fn stage_follows_fields() {
        let mut c = case();
        assert_eq!(c.stage(), CaseStage::Created);
        c.second_party = Some(Address::from_low_u64(2));
        assert_eq!(c.stage(), CaseStage::SecondPartyJoined);
        c.assigned_mediator = Some(MediatorId(1));
        assert_eq!(c.stage(), CaseStage::MediatorAssigned);
        c.case_closed = true;
        assert_eq!(c.stage(), CaseStage::Closed);
        assert!(c.stage().is_terminal());
        assert_eq!(c.stage().to_string(), "CLOSED");
    }

    #[test]
    fn zero_deposit_rejected() {
        let c = case();
        assert!(matches!(
            c.escrow_after(Amount::ZERO),
            Err(LedgerError::InvalidDeposit { .. })
        ));
    }

    #[test]
    fn escrow_overflow_rejected() {
        let mut c = case();
        let max = Amount::from_base_units(u128::MAX);
        let total = c.escrow_after(max).unwrap();
        c.take_deposit(Address::from_low_u64(1), max, total);
        assert!(matches!(
            c.escrow_after(Amount::from_base_units(1)),
            Err(LedgerError::InvalidDeposit { reason: "escrow would overflow", .. })
        ));
    }

    #[test]
    fn deposits_sum_to_escrow() {
        let mut c = case();
        for (party, units) in [(1u64, 5u128), (2, 7)] {
            let amount = Amount::from_base_units(units);
            let total = c.escrow_after(amount).unwrap();
            c.take_deposit(Address::from_low_u64(party), amount, total);
        }
        assert_eq!(c.escrowed_value, Amount::from_base_units(12));
        assert_eq!(c.deposits.len(), 2);
        assert_eq!(c.deposits[1].party, Address::from_low_u64(2));
    }

    #[test]
    fn members_by_side() {
        let mut c = case();
        c.members_mut(PartySide::Second).push(Address::from_low_u64(9));
        assert!(c.members(PartySide::First).is_empty());
        assert_eq!(c.members(PartySide::Second), &[Address::from_low_u64(9)]);
        assert_eq!(c.principal(PartySide::Second), None);
    }
}
