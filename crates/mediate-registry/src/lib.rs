//! # mediate-registry — Mediator Registry
//!
//! Owns the catalog of mediators: identity, categorization, availability,
//! and open-case load.
//!
//! - **Mediator** ([`mediator`]): the stored record and the registration
//!   request.
//!
//! - **Registry** ([`registry`]): the catalog itself, split into two
//!   capability levels. [`MediatorRegistry::admin`] hands out a
//!   [`RegistryAdmin`] only to the configured administrator;
//!   [`MediatorRegistry::view`] hands anyone a read-only [`RegistryView`].
//!
//! - **Load** ([`MediatorLoad`]): the seam through which the case ledger
//!   bumps and releases a mediator's open-case counter. Only the ledger
//!   identity configured with `set_mediation_ledger` is accepted.
//!
//! - **Events** ([`event`]): append-only log of every registry mutation.
//!
//! ## Crate Policy
//!
//! - Leaf component: depends only on `mediate-core`.
//! - Mediators are never deleted; deactivation goes through the
//!   availability and activity flags.

pub mod error;
pub mod event;
pub mod mediator;
pub mod registry;

pub use error::RegistryError;
pub use event::RegistryEvent;
pub use mediator::{Mediator, NewMediator};
pub use registry::{MediatorLoad, MediatorRegistry, RegistryAdmin, RegistryView};
