//! # mediate-ledger — Case Ledger and Mediation Engine
//!
//! Owns mediation cases: who opened them, who joined on either side, what
//! was escrowed, which mediator was assigned, and whether the case is
//! closed.
//!
//! - **Case** ([`case`]): the stored record, the deposit log, the
//!   [`PartySide`] selector, and the derived [`CaseStage`].
//!
//! - **Ledger** ([`ledger`]): [`CaseLedger`] performs every case mutation.
//!   Assignment and closure reach into the registry only through the
//!   [`MediatorLoad`](mediate_registry::MediatorLoad) seam, presenting the
//!   ledger's own address as the caller.
//!
//! - **Engine** ([`engine`]): [`MediationEngine`] composes one registry and
//!   one ledger, wires the registry to trust the ledger, and adds random
//!   mediator selection.
//!
//! ## Case Lifecycle
//!
//! ```text
//!   Created ──join second party──▶ SecondPartyJoined
//!      │                                  │
//!      └───────assign mediator────────────┤
//!                                         ▼
//!                                  MediatorAssigned ──close──▶ Closed
//! ```
//!
//! `Closed` is reachable from every stage and is terminal.
//!
//! ## Crate Policy
//!
//! - Every mutation validates before writing; a rejected call leaves no
//!   partial state.
//! - Registry failures surface unchanged through
//!   [`LedgerError::Registry`].

pub mod case;
pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;

pub use case::{Case, CaseStage, Deposit, PartySide};
pub use engine::MediationEngine;
pub use error::LedgerError;
pub use event::LedgerEvent;
pub use ledger::CaseLedger;
