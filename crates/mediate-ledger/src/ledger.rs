//! # Case Ledger
//!
//! Issues case ids, escrows deposits, records membership, and binds a
//! mediator to each case. The ledger never edits mediator records itself;
//! it asks the registry to adjust load through [`MediatorLoad`], presenting
//! its own [`address`](CaseLedger::address) as the caller.
//!
//! ## Ordering
//!
//! Every operation checks all of its preconditions before it writes. In
//! [`assign_mediator`](CaseLedger::assign_mediator) and
//! [`close_case`](CaseLedger::close_case) the registry call happens before
//! the case is touched, so a registry rejection leaves the case unchanged.

use mediate_core::{Address, Amount, CaseId, Category, MediatorId, Timestamp};
use mediate_registry::MediatorLoad;

use crate::case::{Case, PartySide};
use crate::error::LedgerError;
use crate::event::LedgerEvent;

/// The authoritative collection of cases.
#[derive(Debug, Clone)]
pub struct CaseLedger {
    administrator: Address,
    address: Address,
    cases: Vec<Case>,
    events: Vec<LedgerEvent>,
}

impl CaseLedger {
    /// Create an empty ledger.
    ///
    /// `address` is the identity the ledger presents to the registry; the
    /// registry must be configured to trust it.
    pub fn new(administrator: Address, address: Address) -> Self {
        Self {
            administrator,
            address,
            cases: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Rebuild a ledger from persisted cases.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InconsistentSnapshot`] unless case ids form `1..=n`.
    pub fn restore(
        administrator: Address,
        address: Address,
        mut cases: Vec<Case>,
    ) -> Result<Self, LedgerError> {
        cases.sort_by_key(|c| c.id);
        for (position, case) in cases.iter().enumerate() {
            let expected = CaseId(position as u64 + 1);
            if case.id != expected {
                return Err(LedgerError::InconsistentSnapshot(format!(
                    "expected {expected} at position {position}, found {}",
                    case.id
                )));
            }
        }
        Ok(Self {
            administrator,
            address,
            cases,
            events: Vec::new(),
        })
    }

    pub fn administrator(&self) -> &Address {
        &self.administrator
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    // ── Case creation ──────────────────────────────────────────────────

    /// Open a case with `caller` as first party and escrow `deposit`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidDeposit`] if `deposit` is zero.
    /// - [`LedgerError::InvalidParty`] if `caller` is the zero address.
    pub fn create_case(
        &mut self,
        caller: &Address,
        category: Category,
        deposit: Amount,
    ) -> Result<CaseId, LedgerError> {
        require_party(caller, "first party")?;
        self.open_case(caller, category, caller.clone(), None, deposit)
    }

    /// Open a case on behalf of two parties, with both principals set.
    ///
    /// The deposit is escrowed from `caller`. The case is filed under
    /// [`Category::GENERAL`].
    pub fn company_create_case(
        &mut self,
        caller: &Address,
        first_party: Address,
        second_party: Address,
        deposit: Amount,
    ) -> Result<CaseId, LedgerError> {
        require_party(&first_party, "first party")?;
        require_party(&second_party, "second party")?;
        self.open_case(
            caller,
            Category::GENERAL,
            first_party,
            Some(second_party),
            deposit,
        )
    }

    fn open_case(
        &mut self,
        depositor: &Address,
        category: Category,
        first_party: Address,
        second_party: Option<Address>,
        deposit: Amount,
    ) -> Result<CaseId, LedgerError> {
        let id = self.next_case_id();
        let mut case = Case::open(id, category, first_party, second_party);
        let total = case.escrow_after(deposit)?;
        case.take_deposit(depositor.clone(), deposit, total);

        tracing::info!(
            case_id = id.get(),
            category = category.0,
            first_party = %case.first_party,
            depositor = %depositor,
            deposit = %deposit,
            "case opened"
        );
        self.events.push(LedgerEvent::CaseCreated {
            case_id: id,
            category,
            first_party: case.first_party.clone(),
            second_party: case.second_party.clone(),
            depositor: depositor.clone(),
            deposit,
            timestamp: case.created_at,
        });
        self.cases.push(case);
        Ok(id)
    }

    // ── Joining ────────────────────────────────────────────────────────

    /// Take the second-party slot of an open case and escrow `deposit`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidDeposit`] if `deposit` is zero.
    /// - [`LedgerError::CaseNotJoinable`] if the case is missing, closed, or
    ///   already has a second party.
    pub fn join_case_as_second_party(
        &mut self,
        caller: &Address,
        case_id: CaseId,
        deposit: Amount,
    ) -> Result<(), LedgerError> {
        if deposit.is_zero() {
            return Err(LedgerError::InvalidDeposit {
                amount: deposit,
                reason: "deposit must be positive",
            });
        }
        require_party(caller, "second party")?;
        let case = self.joinable_mut(case_id)?;
        if case.second_party.is_some() {
            return Err(LedgerError::CaseNotJoinable {
                case_id,
                reason: "second party already joined",
            });
        }
        let total = case.escrow_after(deposit)?;
        case.second_party = Some(caller.clone());
        case.take_deposit(caller.clone(), deposit, total);

        tracing::info!(case_id = case_id.get(), second_party = %caller, deposit = %deposit, "second party joined");
        self.events.push(LedgerEvent::SecondPartyJoined {
            case_id,
            second_party: caller.clone(),
            deposit,
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    /// Append `caller` to the group members behind one principal.
    ///
    /// `side` is the wire code: 1 for the first party, 2 for the second.
    /// Repeated joins by the same account are recorded each time.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidParty`] if `side` is not 1 or 2. Checked
    ///   before anything else.
    /// - [`LedgerError::CaseNotJoinable`] if the case is missing, closed, or
    ///   the chosen principal has not joined.
    pub fn join_case(
        &mut self,
        caller: &Address,
        case_id: CaseId,
        side: u8,
    ) -> Result<(), LedgerError> {
        let side = PartySide::try_from(side)?;
        let case = self.joinable_mut(case_id)?;
        if case.principal(side).is_none() {
            return Err(LedgerError::CaseNotJoinable {
                case_id,
                reason: "principal for that side has not joined",
            });
        }
        case.members_mut(side).push(caller.clone());
        case.touch();

        tracing::info!(case_id = case_id.get(), %side, member = %caller, "group member joined");
        self.events.push(LedgerEvent::MemberJoined {
            case_id,
            side,
            member: caller.clone(),
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    // ── Mediator binding ───────────────────────────────────────────────

    /// Check that a mediator may be assigned to the case and return it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] for an unknown case.
    /// - [`LedgerError::CaseNotJoinable`] for a closed case.
    /// - [`LedgerError::MediatorAlreadyAssigned`] if one is already bound.
    pub fn require_assignable(&self, case_id: CaseId) -> Result<&Case, LedgerError> {
        let case = self.get_case(case_id)?;
        if case.case_closed {
            return Err(LedgerError::CaseNotJoinable {
                case_id,
                reason: "case is closed",
            });
        }
        if let Some(mediator_id) = case.assigned_mediator {
            return Err(LedgerError::MediatorAlreadyAssigned {
                case_id,
                mediator_id,
            });
        }
        Ok(case)
    }

    /// Bind `mediator_id` to the case and bump its load in the registry.
    ///
    /// The registry is called first. If it rejects the call (unknown
    /// mediator, untrusted ledger) the error is returned as
    /// [`LedgerError::Registry`] and the case is unchanged.
    pub fn assign_mediator<R: MediatorLoad + ?Sized>(
        &mut self,
        registry: &mut R,
        mediator_id: MediatorId,
        case_id: CaseId,
    ) -> Result<(), LedgerError> {
        self.require_assignable(case_id)?;
        let open_cases = registry.increment_case_count(&self.address, mediator_id)?;

        let case = self.case_mut(case_id)?;
        case.assigned_mediator = Some(mediator_id);
        case.touch();

        tracing::info!(
            case_id = case_id.get(),
            mediator_id = mediator_id.get(),
            open_cases,
            "mediator assigned"
        );
        self.events.push(LedgerEvent::MediatorAssigned {
            case_id,
            mediator_id,
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    // ── Closure ────────────────────────────────────────────────────────

    /// Close a case and release its mediator's load. Escrow stays where it
    /// is; no funds move.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::PermissionDenied`] unless `caller` is the
    ///   administrator.
    /// - [`LedgerError::NotFound`] / [`LedgerError::AlreadyClosed`].
    /// - [`LedgerError::Registry`] if the load release fails; the case stays
    ///   open.
    pub fn close_case<R: MediatorLoad + ?Sized>(
        &mut self,
        caller: &Address,
        registry: &mut R,
        case_id: CaseId,
    ) -> Result<(), LedgerError> {
        if caller != &self.administrator {
            tracing::warn!(%caller, case_id = case_id.get(), "rejected case closure");
            return Err(LedgerError::PermissionDenied {
                caller: caller.clone(),
                operation: "close cases",
            });
        }
        let case = self.get_case(case_id)?;
        if case.case_closed {
            return Err(LedgerError::AlreadyClosed(case_id));
        }
        let mediator_id = case.assigned_mediator;
        if let Some(mediator_id) = mediator_id {
            registry.decrement_case_count(&self.address, mediator_id)?;
        }

        let case = self.case_mut(case_id)?;
        case.case_closed = true;
        case.touch();

        tracing::info!(
            case_id = case_id.get(),
            mediator_id = mediator_id.map(|m| m.get()),
            "case closed"
        );
        self.events.push(LedgerEvent::CaseClosed {
            case_id,
            mediator_id,
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub fn get_case(&self, case_id: CaseId) -> Result<&Case, LedgerError> {
        position(case_id)
            .and_then(|i| self.cases.get(i))
            .ok_or(LedgerError::NotFound(case_id))
    }

    /// Group members behind the first party, in join order.
    pub fn first_party_members(&self, case_id: CaseId) -> Result<&[Address], LedgerError> {
        self.get_case(case_id).map(|c| c.members(PartySide::First))
    }

    /// Group members behind the second party, in join order.
    pub fn second_party_members(&self, case_id: CaseId) -> Result<&[Address], LedgerError> {
        self.get_case(case_id).map(|c| c.members(PartySide::Second))
    }

    /// Every case, in id order.
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn next_case_id(&self) -> CaseId {
        CaseId(self.cases.len() as u64 + 1)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    fn case_mut(&mut self, case_id: CaseId) -> Result<&mut Case, LedgerError> {
        position(case_id)
            .and_then(|i| self.cases.get_mut(i))
            .ok_or(LedgerError::NotFound(case_id))
    }

    /// An existing, open case. Missing cases are reported as not joinable.
    fn joinable_mut(&mut self, case_id: CaseId) -> Result<&mut Case, LedgerError> {
        let case = self
            .case_mut(case_id)
            .map_err(|_| LedgerError::CaseNotJoinable {
                case_id,
                reason: "case does not exist",
            })?;
        if case.case_closed {
            return Err(LedgerError::CaseNotJoinable {
                case_id,
                reason: "case is closed",
            });
        }
        Ok(case)
    }
}

fn position(case_id: CaseId) -> Option<usize> {
    case_id
        .get()
        .checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
}

fn require_party(address: &Address, role: &str) -> Result<(), LedgerError> {
    if address.is_zero() {
        return Err(LedgerError::InvalidParty(format!(
            "{role} may not be the zero address"
        )));
    }
    Ok(())
}
