//! # API Route Modules
//!
//! - [`mediators`]: mediator registry (registration, lookup, flags, trusted ledger).
//! - [`cases`]: case ledger (open, join, assign, close).
//! - [`events`]: registry and ledger event logs.

pub mod cases;
pub mod events;
pub mod mediators;
