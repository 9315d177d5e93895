//! # Mediator Registry
//!
//! The catalog of registered mediators, with writes split by capability:
//!
//! ```text
//!                       ┌──────────────────────────────┐
//!  administrator ──────▶│ RegistryAdmin                │ create / flags / ledger
//!                       │                              │
//!  anyone ─────────────▶│ RegistryView                 │ reads
//!                       │                              │
//!  mediation ledger ───▶│ MediatorLoad                 │ open-case counters
//!                       └──────────────────────────────┘
//! ```
//!
//! Mediator ids are issued sequentially from 1 and double as positions in
//! the append-only record vector, so enumeration is always creation order.

use mediate_core::{Address, Category, MediatorId, Timestamp};

use crate::error::RegistryError;
use crate::event::RegistryEvent;
use crate::mediator::{Mediator, NewMediator};

/// Load-counter operations the case ledger performs on the registry.
///
/// `caller` is the identity the ledger presents; implementations must
/// reject every caller other than the configured mediation ledger.
pub trait MediatorLoad {
    /// Record one more open case for the mediator. Returns the new count.
    fn increment_case_count(
        &mut self,
        caller: &Address,
        id: MediatorId,
    ) -> Result<u64, RegistryError>;

    /// Release one open case from the mediator. Returns the new count.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Underflow`] if the count is already zero.
    fn decrement_case_count(
        &mut self,
        caller: &Address,
        id: MediatorId,
    ) -> Result<u64, RegistryError>;
}

/// The mediator catalog.
#[derive(Debug, Clone)]
pub struct MediatorRegistry {
    administrator: Address,
    mediation_ledger: Option<Address>,
    mediators: Vec<Mediator>,
    events: Vec<RegistryEvent>,
}

impl MediatorRegistry {
    /// Create an empty registry administered by `administrator`.
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            mediation_ledger: None,
            mediators: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Create an empty registry that already trusts `ledger` for load
    /// changes. Used when both components are deployed together.
    pub fn with_mediation_ledger(administrator: Address, ledger: Address) -> Self {
        let mut registry = Self::new(administrator);
        RegistryAdmin {
            registry: &mut registry,
        }
        .set_mediation_ledger(ledger);
        registry
    }

    /// Rebuild a registry from persisted records.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InconsistentSnapshot`] unless the record ids
    /// form the contiguous sequence `1..=n`.
    pub fn restore(
        administrator: Address,
        mediation_ledger: Option<Address>,
        mut mediators: Vec<Mediator>,
    ) -> Result<Self, RegistryError> {
        mediators.sort_by_key(|m| m.id);
        for (position, mediator) in mediators.iter().enumerate() {
            let expected = MediatorId(position as u64 + 1);
            if mediator.id != expected {
                return Err(RegistryError::InconsistentSnapshot(format!(
                    "expected {expected} at position {position}, found {}",
                    mediator.id
                )));
            }
        }
        Ok(Self {
            administrator,
            mediation_ledger,
            mediators,
            events: Vec::new(),
        })
    }

    /// The configured administrator.
    pub fn administrator(&self) -> &Address {
        &self.administrator
    }

    /// Obtain the administrative handle.
    ///
    /// # Errors
    ///
    /// [`RegistryError::PermissionDenied`] unless `caller` is the administrator.
    pub fn admin(&mut self, caller: &Address) -> Result<RegistryAdmin<'_>, RegistryError> {
        if caller != &self.administrator {
            tracing::warn!(%caller, "rejected administrative registry access");
            return Err(RegistryError::PermissionDenied {
                caller: caller.clone(),
                operation: "administer the mediator registry",
            });
        }
        Ok(RegistryAdmin { registry: self })
    }

    /// Obtain the public read-only view.
    pub fn view(&self) -> RegistryView<'_> {
        RegistryView { registry: self }
    }

    fn get(&self, id: MediatorId) -> Result<&Mediator, RegistryError> {
        position(id)
            .and_then(|i| self.mediators.get(i))
            .ok_or(RegistryError::NotFound(id))
    }

    fn get_mut(&mut self, id: MediatorId) -> Result<&mut Mediator, RegistryError> {
        position(id)
            .and_then(|i| self.mediators.get_mut(i))
            .ok_or(RegistryError::NotFound(id))
    }

    fn require_ledger(
        &self,
        caller: &Address,
        operation: &'static str,
    ) -> Result<(), RegistryError> {
        match &self.mediation_ledger {
            Some(ledger) if ledger == caller => Ok(()),
            _ => {
                tracing::warn!(%caller, operation, "rejected load change from untrusted caller");
                Err(RegistryError::PermissionDenied {
                    caller: caller.clone(),
                    operation,
                })
            }
        }
    }

    fn record_count_change(&mut self, id: MediatorId, open_case_count: u64) {
        tracing::info!(mediator_id = id.get(), open_case_count, "mediator load changed");
        self.events.push(RegistryEvent::CaseCountChanged {
            id,
            open_case_count,
            timestamp: Timestamp::now(),
        });
    }
}

impl MediatorLoad for MediatorRegistry {
    fn increment_case_count(
        &mut self,
        caller: &Address,
        id: MediatorId,
    ) -> Result<u64, RegistryError> {
        self.require_ledger(caller, "increment case counts")?;
        let mediator = self.get_mut(id)?;
        mediator.open_case_count += 1;
        let count = mediator.open_case_count;
        self.record_count_change(id, count);
        Ok(count)
    }

    fn decrement_case_count(
        &mut self,
        caller: &Address,
        id: MediatorId,
    ) -> Result<u64, RegistryError> {
        self.require_ledger(caller, "decrement case counts")?;
        let mediator = self.get_mut(id)?;
        mediator.open_case_count = mediator
            .open_case_count
            .checked_sub(1)
            .ok_or(RegistryError::Underflow(id))?;
        let count = mediator.open_case_count;
        self.record_count_change(id, count);
        Ok(count)
    }
}

/// Map an id onto its position in the record vector.
fn position(id: MediatorId) -> Option<usize> {
    id.get()
        .checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
}

// ── Administrative handle ──────────────────────────────────────────────

/// Mutating operations reserved for the registry administrator.
#[derive(Debug)]
pub struct RegistryAdmin<'a> {
    registry: &'a mut MediatorRegistry,
}

impl RegistryAdmin<'_> {
    /// Register a mediator and return its id.
    ///
    /// The new record starts available and active with no open cases.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidOwner`] if the owner is the zero address.
    pub fn create_mediator(&mut self, new: NewMediator) -> Result<MediatorId, RegistryError> {
        if new.owner.is_zero() {
            return Err(RegistryError::InvalidOwner(new.owner));
        }
        let registry = &mut *self.registry;
        let id = MediatorId(registry.mediators.len() as u64 + 1);
        let mediator = Mediator::register(id, new, Timestamp::now());

        registry.events.push(RegistryEvent::MediatorCreated {
            id,
            owner: mediator.owner.clone(),
            category: mediator.category,
            time_zone: mediator.time_zone.clone(),
            languages: mediator.languages.clone(),
            certifications: mediator.certifications.clone(),
            dao_experience: mediator.dao_experience,
            timestamp: mediator.timestamp,
        });
        tracing::info!(
            mediator_id = id.get(),
            owner = %mediator.owner,
            category = mediator.category.0,
            "mediator registered"
        );
        registry.mediators.push(mediator);
        Ok(id)
    }

    /// Set the single ledger identity allowed to change load counters.
    /// Overwrites any previous value.
    pub fn set_mediation_ledger(&mut self, ledger: Address) {
        tracing::info!(%ledger, "mediation ledger configured");
        self.registry.events.push(RegistryEvent::MediationLedgerSet {
            ledger: ledger.clone(),
            timestamp: Timestamp::now(),
        });
        self.registry.mediation_ledger = Some(ledger);
    }

    /// Mark a mediator as (un)available for new cases.
    pub fn set_availability(
        &mut self,
        id: MediatorId,
        is_available: bool,
    ) -> Result<(), RegistryError> {
        self.registry.get_mut(id)?.is_available = is_available;
        tracing::info!(mediator_id = id.get(), is_available, "mediator availability changed");
        self.registry.events.push(RegistryEvent::AvailabilityChanged {
            id,
            is_available,
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    /// Activate or deactivate a mediator.
    pub fn set_active(&mut self, id: MediatorId, is_active: bool) -> Result<(), RegistryError> {
        self.registry.get_mut(id)?.is_active = is_active;
        tracing::info!(mediator_id = id.get(), is_active, "mediator activity changed");
        self.registry.events.push(RegistryEvent::ActivityChanged {
            id,
            is_active,
            timestamp: Timestamp::now(),
        });
        Ok(())
    }
}

// ── Public view ────────────────────────────────────────────────────────

/// Side-effect-free reads over the latest registry state.
#[derive(Debug, Clone, Copy)]
pub struct RegistryView<'a> {
    registry: &'a MediatorRegistry,
}

impl<'a> RegistryView<'a> {
    /// Full record for a mediator.
    pub fn get_mediator(&self, id: MediatorId) -> Result<&'a Mediator, RegistryError> {
        self.registry.get(id)
    }

    pub fn is_available(&self, id: MediatorId) -> Result<bool, RegistryError> {
        self.registry.get(id).map(|m| m.is_available)
    }

    pub fn is_active(&self, id: MediatorId) -> Result<bool, RegistryError> {
        self.registry.get(id).map(|m| m.is_active)
    }

    /// Owner address of every mediator, in creation order.
    pub fn all_mediators(&self) -> Vec<Address> {
        self.registry
            .mediators
            .iter()
            .map(|m| m.owner.clone())
            .collect()
    }

    /// Owner addresses of mediators in `category`, in creation order.
    pub fn mediators_by_category(&self, category: Category) -> Vec<Address> {
        self.registry
            .mediators
            .iter()
            .filter(|m| m.category == category)
            .map(|m| m.owner.clone())
            .collect()
    }

    /// Ids of available, active mediators in `category`, in creation order.
    pub fn eligible_mediators(&self, category: Category) -> Vec<MediatorId> {
        self.registry
            .mediators
            .iter()
            .filter(|m| m.category == category && m.is_eligible())
            .map(|m| m.id)
            .collect()
    }

    /// Every record, in creation order.
    pub fn mediators(&self) -> &'a [Mediator] {
        &self.registry.mediators
    }

    pub fn mediator_count(&self) -> usize {
        self.registry.mediators.len()
    }

    /// The id the next registration will receive.
    pub fn next_mediator_id(&self) -> MediatorId {
        MediatorId(self.registry.mediators.len() as u64 + 1)
    }

    pub fn mediation_ledger(&self) -> Option<&'a Address> {
        self.registry.mediation_ledger.as_ref()
    }

    pub fn events(&self) -> &'a [RegistryEvent] {
        &self.registry.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_low_u64(0xA0)
    }

    fn ledger() -> Address {
        Address::from_low_u64(0x4079)
    }

    fn new_mediator(owner: u64, category: u32) -> NewMediator {
        NewMediator {
            owner: Address::from_low_u64(owner),
            time_zone: "PST".to_string(),
            languages: "English".to_string(),
            certifications: "Some Cert".to_string(),
            dao_experience: true,
            category: Category(category),
        }
    }

    fn registry_with_ledger() -> MediatorRegistry {
        let mut registry = MediatorRegistry::new(admin());
        registry.admin(&admin()).unwrap().set_mediation_ledger(ledger());
        registry
    }

    #[test]
    fn create_mediator_stores_fresh_record() {
        let mut registry = MediatorRegistry::new(admin());
        let id = registry
            .admin(&admin())
            .unwrap()
            .create_mediator(new_mediator(1, 0))
            .unwrap();
        assert_eq!(id, MediatorId(1));

        let view = registry.view();
        let m = view.get_mediator(id).unwrap();
        assert_eq!(m.owner, Address::from_low_u64(1));
        assert_eq!(m.time_zone, "PST");
        assert_eq!(m.languages, "English");
        assert_eq!(m.certifications, "Some Cert");
        assert!(m.dao_experience);
        assert_eq!(m.open_case_count, 0);
        assert!(view.is_available(id).unwrap());
        assert!(view.is_active(id).unwrap());
        assert_eq!(view.next_mediator_id(), MediatorId(2));
    }

    #[test]
    fn create_mediator_emits_full_snapshot() {
        let mut registry = MediatorRegistry::new(admin());
        let id = registry
            .admin(&admin())
            .unwrap()
            .create_mediator(new_mediator(1, 3))
            .unwrap();
        let stored = registry.view().get_mediator(id).unwrap().clone();
        assert_eq!(
            registry.view().events(),
            &[RegistryEvent::MediatorCreated {
                id,
                owner: stored.owner.clone(),
                category: Category(3),
                time_zone: "PST".to_string(),
                languages: "English".to_string(),
                certifications: "Some Cert".to_string(),
                dao_experience: true,
                timestamp: stored.timestamp,
            }]
        );
    }

    #[test]
    fn non_admin_is_denied_and_count_unchanged() {
        let mut registry = MediatorRegistry::new(admin());
        let outsider = Address::from_low_u64(1);
        let err = registry
            .admin(&outsider)
            .and_then(|mut a| a.create_mediator(new_mediator(1, 0)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::PermissionDenied { .. }));
        assert_eq!(registry.view().mediator_count(), 0);
        assert!(registry.view().events().is_empty());
    }

    #[test]
    fn zero_owner_rejected() {
        let mut registry = MediatorRegistry::new(admin());
        let mut req = new_mediator(1, 0);
        req.owner = Address::zero();
        let err = registry.admin(&admin()).unwrap().create_mediator(req).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidOwner(_)));
        assert_eq!(registry.view().mediator_count(), 0);
    }

    #[test]
    fn reads_of_unknown_ids_fail() {
        let registry = MediatorRegistry::new(admin());
        assert_eq!(
            registry.view().is_available(MediatorId(1)),
            Err(RegistryError::NotFound(MediatorId(1)))
        );
        assert_eq!(
            registry.view().is_active(MediatorId(0)),
            Err(RegistryError::NotFound(MediatorId(0)))
        );
    }

    #[test]
    fn all_mediators_in_creation_order() {
        let mut registry = MediatorRegistry::new(admin());
        {
            let mut a = registry.admin(&admin()).unwrap();
            a.create_mediator(new_mediator(1, 0)).unwrap();
            a.create_mediator(new_mediator(2, 1)).unwrap();
            a.create_mediator(new_mediator(3, 0)).unwrap();
        }
        let view = registry.view();
        assert_eq!(
            view.all_mediators(),
            vec![
                Address::from_low_u64(1),
                Address::from_low_u64(2),
                Address::from_low_u64(3)
            ]
        );
        assert_eq!(
            view.mediators_by_category(Category(0)),
            vec![Address::from_low_u64(1), Address::from_low_u64(3)]
        );
        assert!(view.mediators_by_category(Category(9)).is_empty());
    }

    #[test]
    fn set_mediation_ledger_overwrites() {
        let mut registry = registry_with_ledger();
        let other = Address::from_low_u64(0x1230);
        registry.admin(&admin()).unwrap().set_mediation_ledger(other.clone());
        assert_eq!(registry.view().mediation_ledger(), Some(&other));
    }

    #[test]
    fn with_mediation_ledger_trusts_ledger_from_start() {
        let mut registry = MediatorRegistry::with_mediation_ledger(admin(), ledger());
        assert_eq!(registry.view().mediation_ledger(), Some(&ledger()));
        assert!(matches!(
            registry.view().events(),
            [RegistryEvent::MediationLedgerSet { .. }]
        ));
        registry
            .admin(&admin())
            .unwrap()
            .create_mediator(new_mediator(1, 0))
            .unwrap();
        assert_eq!(registry.increment_case_count(&ledger(), MediatorId(1)), Ok(1));
    }

    #[test]
    fn load_changes_require_configured_ledger() {
        let mut registry = MediatorRegistry::new(admin());
        registry
            .admin(&admin())
            .unwrap()
            .create_mediator(new_mediator(1, 0))
            .unwrap();

        // No ledger configured yet: even the administrator is rejected.
        let err = registry.increment_case_count(&admin(), MediatorId(1)).unwrap_err();
        assert!(matches!(err, RegistryError::PermissionDenied { .. }));

        registry.admin(&admin()).unwrap().set_mediation_ledger(ledger());
        let err = registry
            .increment_case_count(&Address::from_low_u64(7), MediatorId(1))
            .unwrap_err();
        assert!(matches!(err, RegistryError::PermissionDenied { .. }));
        assert_eq!(registry.increment_case_count(&ledger(), MediatorId(1)), Ok(1));
    }

    #[test]
    fn decrement_never_goes_negative() {
        let mut registry = registry_with_ledger();
        registry
            .admin(&admin())
            .unwrap()
            .create_mediator(new_mediator(1, 0))
            .unwrap();
        let id = MediatorId(1);

        assert_eq!(
            registry.decrement_case_count(&ledger(), id),
            Err(RegistryError::Underflow(id))
        );
        registry.increment_case_count(&ledger(), id).unwrap();
        registry.increment_case_count(&ledger(), id).unwrap();
        assert_eq!(registry.decrement_case_count(&ledger(), id), Ok(1));
        assert_eq!(registry.decrement_case_count(&ledger(), id), Ok(0));
        assert_eq!(
            registry.decrement_case_count(&ledger(), id),
            Err(RegistryError::Underflow(id))
        );
        assert_eq!(registry.view().get_mediator(id).unwrap().open_case_count, 0);
    }

    #[test]
    fn load_change_on_unknown_mediator() {
        let mut registry = registry_with_ledger();
        assert_eq!(
            registry.increment_case_count(&ledger(), MediatorId(5)),
            Err(RegistryError::NotFound(MediatorId(5)))
        );
    }

    #[test]
    fn flags_drive_eligibility() {
        let mut registry = MediatorRegistry::new(admin());
        {
            let mut a = registry.admin(&admin()).unwrap();
            a.create_mediator(new_mediator(1, 2)).unwrap();
            a.create_mediator(new_mediator(2, 2)).unwrap();
            a.create_mediator(new_mediator(3, 2)).unwrap();
            a.set_availability(MediatorId(1), false).unwrap();
            a.set_active(MediatorId(3), false).unwrap();
        }
        let view = registry.view();
        assert_eq!(view.eligible_mediators(Category(2)), vec![MediatorId(2)]);
        assert!(!view.is_available(MediatorId(1)).unwrap());
        assert!(!view.is_active(MediatorId(3)).unwrap());
        // Deactivated mediators are still enumerated.
        assert_eq!(view.mediators_by_category(Category(2)).len(), 3);
    }

    #[test]
    fn flag_change_on_unknown_mediator() {
        let mut registry = MediatorRegistry::new(admin());
        let err = registry
            .admin(&admin())
            .unwrap()
            .set_availability(MediatorId(1), false)
            .unwrap_err();
        assert_eq!(err, RegistryError::NotFound(MediatorId(1)));
    }

    #[test]
    fn restore_rejects_gaps() {
        let mut registry = MediatorRegistry::new(admin());
        {
            let mut a = registry.admin(&admin()).unwrap();
            a.create_mediator(new_mediator(1, 0)).unwrap();
            a.create_mediator(new_mediator(2, 0)).unwrap();
        }
        let mut records = registry.view().mediators().to_vec();
        records.reverse();
        let restored = MediatorRegistry::restore(admin(), Some(ledger()), records.clone()).unwrap();
        assert_eq!(restored.view().next_mediator_id(), MediatorId(3));
        assert_eq!(restored.view().mediation_ledger(), Some(&ledger()));

        records.remove(0);
        let err = MediatorRegistry::restore(admin(), None, records).unwrap_err();
        assert!(matches!(err, RegistryError::InconsistentSnapshot(_)));
    }
}
