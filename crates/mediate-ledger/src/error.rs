//! # Ledger Error Types

use mediate_core::{Address, Amount, CaseId, Category, MediatorId};
use mediate_registry::RegistryError;
use thiserror::Error;

/// Errors arising from case ledger and engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller is not the ledger administrator.
    #[error("permission denied: {caller} may not {operation}")]
    PermissionDenied {
        caller: Address,
        operation: &'static str,
    },

    /// The case id was never issued.
    #[error("{0} not found")]
    NotFound(CaseId),

    /// The case cannot accept the requested join or assignment.
    #[error("{case_id} is not joinable: {reason}")]
    CaseNotJoinable {
        case_id: CaseId,
        reason: &'static str,
    },

    /// Party selector outside {1, 2}, or a zero principal address.
    #[error("invalid party: {0}")]
    InvalidParty(String),

    /// Deposit was zero or would overflow the escrow.
    #[error("invalid deposit of {amount}: {reason}")]
    InvalidDeposit {
        amount: Amount,
        reason: &'static str,
    },

    /// The case already holds a mediator.
    #[error("{case_id} already has {mediator_id} assigned")]
    MediatorAlreadyAssigned {
        case_id: CaseId,
        mediator_id: MediatorId,
    },

    /// The case was already closed.
    #[error("{0} is already closed")]
    AlreadyClosed(CaseId),

    /// Random selection found no available, active mediator.
    #[error("no eligible mediator in {category} for {case_id}")]
    NoEligibleMediator { case_id: CaseId, category: Category },

    /// Persisted cases do not form a contiguous id sequence.
    #[error("inconsistent ledger snapshot: {0}")]
    InconsistentSnapshot(String),

    /// A registry call made on the ledger's behalf failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
