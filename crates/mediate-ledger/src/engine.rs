//! # Mediation Engine
//!
//! Composes one [`MediatorRegistry`] and one [`CaseLedger`] into the single
//! authoritative state machine. At construction the registry is told to
//! trust the ledger's address, so load counters can only move as a side
//! effect of assignment and closure.
//!
//! Callers are passed explicitly to every privileged operation; the engine
//! itself holds no notion of a current user.

use mediate_core::{Address, Amount, CaseId, Category, MediatorId};
use mediate_registry::{
    Mediator, MediatorRegistry, RegistryAdmin, RegistryError, RegistryEvent, RegistryView,
};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::case::Case;
use crate::error::LedgerError;
use crate::event::LedgerEvent;
use crate::ledger::CaseLedger;

/// Registry plus ledger, wired together.
#[derive(Debug, Clone)]
pub struct MediationEngine {
    registry: MediatorRegistry,
    ledger: CaseLedger,
}

impl MediationEngine {
    /// Deploy a fresh registry and ledger.
    ///
    /// `administrator` administers both; `ledger_address` is the identity
    /// the ledger presents to the registry.
    pub fn new(administrator: Address, ledger_address: Address) -> Self {
        let registry =
            MediatorRegistry::with_mediation_ledger(administrator.clone(), ledger_address.clone());
        let ledger = CaseLedger::new(administrator, ledger_address);
        tracing::info!(
            administrator = %ledger.administrator(),
            ledger = %ledger.address(),
            "mediation engine deployed"
        );
        Self { registry, ledger }
    }

    /// Rebuild from persisted records.
    ///
    /// `trusted_ledger` is the registry's stored trusted caller, which may
    /// differ from `ledger_address` if an administrator repointed it.
    pub fn restore(
        administrator: Address,
        ledger_address: Address,
        trusted_ledger: Option<Address>,
        mediators: Vec<Mediator>,
        cases: Vec<Case>,
    ) -> Result<Self, LedgerError> {
        let registry = MediatorRegistry::restore(administrator.clone(), trusted_ledger, mediators)?;
        let ledger = CaseLedger::restore(administrator, ledger_address, cases)?;
        tracing::info!(
            mediators = registry.view().mediator_count(),
            cases = ledger.case_count(),
            "mediation engine restored"
        );
        Ok(Self { registry, ledger })
    }

    // ── Registry ───────────────────────────────────────────────────────

    /// Administrative registry handle for `caller`.
    pub fn registry_admin(&mut self, caller: &Address) -> Result<RegistryAdmin<'_>, RegistryError> {
        self.registry.admin(caller)
    }

    pub fn registry(&self) -> RegistryView<'_> {
        self.registry.view()
    }

    pub fn registry_events(&self) -> &[RegistryEvent] {
        self.registry.view().events()
    }

    // ── Ledger ─────────────────────────────────────────────────────────

    pub fn ledger(&self) -> &CaseLedger {
        &self.ledger
    }

    pub fn ledger_events(&self) -> &[LedgerEvent] {
        self.ledger.events()
    }

    pub fn create_case(
        &mut self,
        caller: &Address,
        category: Category,
        deposit: Amount,
    ) -> Result<CaseId, LedgerError> {
        self.ledger.create_case(caller, category, deposit)
    }

    pub fn company_create_case(
        &mut self,
        caller: &Address,
        first_party: Address,
        second_party: Address,
        deposit: Amount,
    ) -> Result<CaseId, LedgerError> {
        self.ledger
            .company_create_case(caller, first_party, second_party, deposit)
    }

    pub fn join_case_as_second_party(
        &mut self,
        caller: &Address,
        case_id: CaseId,
        deposit: Amount,
    ) -> Result<(), LedgerError> {
        self.ledger
            .join_case_as_second_party(caller, case_id, deposit)
    }

    pub fn join_case(&mut self, caller: &Address, case_id: CaseId, side: u8) -> Result<(), LedgerError> {
        self.ledger.join_case(caller, case_id, side)
    }

    pub fn assign_mediator(
        &mut self,
        mediator_id: MediatorId,
        case_id: CaseId,
    ) -> Result<(), LedgerError> {
        self.ledger
            .assign_mediator(&mut self.registry, mediator_id, case_id)
    }

    /// Assign a mediator drawn uniformly from the available, active
    /// mediators in the case's category.
    ///
    /// # Errors
    ///
    /// The assignability errors of [`CaseLedger::require_assignable`], then
    /// [`LedgerError::NoEligibleMediator`] if the pool is empty.
    pub fn assign_random_mediator<R: Rng + ?Sized>(
        &mut self,
        case_id: CaseId,
        rng: &mut R,
    ) -> Result<MediatorId, LedgerError> {
        let category = self.ledger.require_assignable(case_id)?.category;
        let pool = self.registry.view().eligible_mediators(category);
        let mediator_id = *pool
            .choose(rng)
            .ok_or(LedgerError::NoEligibleMediator { case_id, category })?;
        tracing::debug!(
            case_id = case_id.get(),
            pool = pool.len(),
            mediator_id = mediator_id.get(),
            "mediator drawn"
        );
        self.assign_mediator(mediator_id, case_id)?;
        Ok(mediator_id)
    }

    pub fn close_case(&mut self, caller: &Address, case_id: CaseId) -> Result<(), LedgerError> {
        self.ledger.close_case(caller, &mut self.registry, case_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediate_registry::NewMediator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn admin() -> Address {
        Address::from_low_u64(0xA0)
    }

    fn engine() -> MediationEngine {
        MediationEngine::new(admin(), Address::from_low_u64(1))
    }

    fn add_mediator(engine: &mut MediationEngine, owner: u64, category: u32) -> MediatorId {
        engine
            .registry_admin(&admin())
            .unwrap()
            .create_mediator(NewMediator {
                owner: Address::from_low_u64(owner),
                time_zone: "UTC".to_string(),
                languages: "English".to_string(),
                certifications: String::new(),
                dao_experience: false,
                category: Category(category),
            })
            .unwrap()
    }

    #[test]
    fn registry_trusts_engine_ledger() {
        let e = engine();
        assert_eq!(e.registry().mediation_ledger(), Some(e.ledger().address()));
    }

    #[test]
    fn random_assignment_only_picks_eligible() {
        let mut e = engine();
        let busy = add_mediator(&mut e, 0x10, 4);
        let idle = add_mediator(&mut e, 0x11, 4);
        add_mediator(&mut e, 0x12, 5);
        e.registry_admin(&admin())
            .unwrap()
            .set_availability(busy, false)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(4079);
        for _ in 0..5 {
            let case_id = e
                .create_case(&Address::from_low_u64(7), Category(4), Amount::from_base_units(1))
                .unwrap();
            let picked = e.assign_random_mediator(case_id, &mut rng).unwrap();
            assert_eq!(picked, idle);
        }
        assert_eq!(e.registry().get_mediator(idle).unwrap().open_case_count, 5);
    }

    #[test]
    fn random_assignment_with_empty_pool() {
        let mut e = engine();
        add_mediator(&mut e, 0x10, 1);
        let case_id = e
            .create_case(&Address::from_low_u64(7), Category(2), Amount::from_base_units(1))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            e.assign_random_mediator(case_id, &mut rng),
            Err(LedgerError::NoEligibleMediator {
                case_id,
                category: Category(2)
            })
        );
    }

    #[test]
    fn random_assignment_respects_existing_mediator() {
        let mut e = engine();
        let m = add_mediator(&mut e, 0x10, 0);
        let case_id = e
            .create_case(&Address::from_low_u64(7), Category(0), Amount::from_base_units(1))
            .unwrap();
        e.assign_mediator(m, case_id).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            e.assign_random_mediator(case_id, &mut rng),
            Err(LedgerError::MediatorAlreadyAssigned { .. })
        ));
    }

    #[test]
    fn closing_releases_load() {
        let mut e = engine();
        let m = add_mediator(&mut e, 0x10, 0);
        let case_id = e
            .create_case(&Address::from_low_u64(7), Category(0), Amount::from_base_units(1))
            .unwrap();
        e.assign_mediator(m, case_id).unwrap();
        e.close_case(&admin(), case_id).unwrap();
        assert_eq!(e.registry().get_mediator(m).unwrap().open_case_count, 0);
    }

    #[test]
    fn restore_round_trips_state() {
        let mut e = engine();
        let m = add_mediator(&mut e, 0x10, 0);
        let case_id = e
            .create_case(&Address::from_low_u64(7), Category(0), Amount::from_base_units(1))
            .unwrap();
        e.assign_mediator(m, case_id).unwrap();

        let restored = MediationEngine::restore(
            admin(),
            e.ledger().address().clone(),
            e.registry().mediation_ledger().cloned(),
            e.registry().mediators().to_vec(),
            e.ledger().cases().to_vec(),
        )
        .unwrap();
        assert_eq!(restored.registry().next_mediator_id(), MediatorId(2));
        assert_eq!(restored.ledger().next_case_id(), CaseId(2));
        assert_eq!(restored.registry().get_mediator(m).unwrap().open_case_count, 1);
        assert!(restored.ledger_events().is_empty());
    }
}
