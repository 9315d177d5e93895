//! # Registry Error Types
//!
//! Every variant carries the identifier or caller involved so operators can
//! diagnose a rejection without inspecting logs.

use mediate_core::{Address, MediatorId};
use thiserror::Error;

/// Errors arising from mediator registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Caller is neither the administrator nor, for load changes, the
    /// configured mediation ledger.
    #[error("permission denied: {caller} may not {operation}")]
    PermissionDenied {
        /// The rejected caller.
        caller: Address,
        /// The attempted operation.
        operation: &'static str,
    },

    /// The mediator id was never issued.
    #[error("{0} not found")]
    NotFound(MediatorId),

    /// Releasing a case from a mediator with no open cases.
    #[error("{0} has no open cases to release")]
    Underflow(MediatorId),

    /// Registration with the zero address as owner.
    #[error("invalid mediator owner {0}")]
    InvalidOwner(Address),

    /// Persisted records do not form a contiguous id sequence.
    #[error("inconsistent registry snapshot: {0}")]
    InconsistentSnapshot(String),
}
