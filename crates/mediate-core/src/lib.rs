//! # mediate-core — Foundational Types for the Mediation Registry
//!
//! Defines the primitives shared by the mediator registry, the case ledger,
//! and the API layer. Every other crate in the workspace depends on
//! `mediate-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `Address`, `MediatorId`,
//!    `CaseId`, `Category`. You cannot pass a case id where a mediator id
//!    is expected.
//!
//! 2. **Integer-only money.** `Amount` holds base units (18 decimals).
//!    Decimal strings are parsed exactly; floats never enter the system.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC, truncated to seconds.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mediate-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use amount::{Amount, AMOUNT_DECIMALS};
pub use error::ValidationError;
pub use identity::{Address, CaseId, Category, MediatorId};
pub use temporal::Timestamp;
