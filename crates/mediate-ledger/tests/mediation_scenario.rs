//! End-to-end mediation flow through the engine.
//!
//! Walks the lifecycle a deployment sees in practice: an administrator
//! registers a mediator, one party opens a case, a stranger fails to join a
//! case that does not exist, the counterparty joins, a supporter joins
//! behind the first party, and the mediator is assigned.

use mediate_core::{Address, Amount, CaseId, Category, MediatorId};
use mediate_ledger::{CaseStage, LedgerError, LedgerEvent, MediationEngine};
use mediate_registry::{NewMediator, RegistryError, RegistryEvent};

fn admin() -> Address {
    Address::new("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap()
}

fn ledger_identity() -> Address {
    Address::from_low_u64(1)
}

fn mediator_a() -> NewMediator {
    NewMediator {
        owner: Address::new("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap(),
        time_zone: "GMT + 1".to_string(),
        languages: "English".to_string(),
        certifications: "Some Cert".to_string(),
        dao_experience: true,
        category: Category(0),
    }
}

#[test]
fn full_mediation_flow() {
    let mut engine = MediationEngine::new(admin(), ledger_identity());
    let party_x = Address::from_low_u64(0x10);
    let party_y = Address::from_low_u64(0x20);
    let party_z = Address::from_low_u64(0x30);
    let stranger = Address::from_low_u64(0x40);
    let deposit = Amount::parse_decimal("0.0015").unwrap();

    let a = engine
        .registry_admin(&admin())
        .unwrap()
        .create_mediator(mediator_a())
        .unwrap();
    assert_eq!(a, MediatorId(1));
    assert!(engine.registry().is_available(a).unwrap());
    assert!(matches!(
        engine.registry_events().last(),
        Some(RegistryEvent::MediatorCreated { id, .. }) if *id == a
    ));

    let case = engine.create_case(&party_x, Category(0), deposit).unwrap();
    assert_eq!(case, CaseId(1));
    assert_eq!(engine.ledger().get_case(case).unwrap().first_party, party_x);

    let err = engine
        .join_case_as_second_party(&stranger, CaseId(2), deposit)
        .unwrap_err();
    assert!(matches!(err, LedgerError::CaseNotJoinable { .. }));

    engine
        .join_case_as_second_party(&party_y, case, deposit)
        .unwrap();
    assert_eq!(
        engine.ledger().get_case(case).unwrap().second_party,
        Some(party_y.clone())
    );

    engine.join_case(&party_z, case, 1).unwrap();
    assert_eq!(engine.ledger().first_party_members(case).unwrap().len(), 1);

    engine.assign_mediator(a, case).unwrap();
    assert_eq!(engine.registry().get_mediator(a).unwrap().open_case_count, 1);

    let stored = engine.ledger().get_case(case).unwrap();
    assert_eq!(stored.stage(), CaseStage::MediatorAssigned);
    assert_eq!(
        stored.escrowed_value,
        Amount::parse_decimal("0.003").unwrap()
    );

    let kinds: Vec<&str> = engine
        .ledger_events()
        .iter()
        .map(|e| match e {
            LedgerEvent::CaseCreated { .. } => "created",
            LedgerEvent::SecondPartyJoined { .. } => "second_party",
            LedgerEvent::MemberJoined { .. } => "member",
            LedgerEvent::MediatorAssigned { .. } => "assigned",
            LedgerEvent::CaseClosed { .. } => "closed",
        })
        .collect();
    assert_eq!(kinds, ["created", "second_party", "member", "assigned"]);
}

#[test]
fn non_admin_registration_is_rejected() {
    let mut engine = MediationEngine::new(admin(), ledger_identity());
    let outsider = Address::from_low_u64(0x10);
    let err = engine
        .registry_admin(&outsider)
        .and_then(|mut handle| handle.create_mediator(mediator_a()))
        .unwrap_err();
    assert!(matches!(err, RegistryError::PermissionDenied { .. }));
    assert_eq!(engine.registry().mediator_count(), 0);
}

#[test]
fn closed_case_rejects_every_join() {
    let mut engine = MediationEngine::new(admin(), ledger_identity());
    let a = engine
        .registry_admin(&admin())
        .unwrap()
        .create_mediator(mediator_a())
        .unwrap();
    let deposit = Amount::from_base_units(1);
    let case = engine
        .create_case(&Address::from_low_u64(0x10), Category(0), deposit)
        .unwrap();
    engine.assign_mediator(a, case).unwrap();
    engine.close_case(&admin(), case).unwrap();

    assert_eq!(engine.registry().get_mediator(a).unwrap().open_case_count, 0);
    assert!(matches!(
        engine.join_case_as_second_party(&Address::from_low_u64(0x20), case, deposit),
        Err(LedgerError::CaseNotJoinable { .. })
    ));
    assert!(matches!(
        engine.join_case(&Address::from_low_u64(0x30), case, 1),
        Err(LedgerError::CaseNotJoinable { .. })
    ));
    assert!(matches!(
        engine.assign_mediator(a, case),
        Err(LedgerError::CaseNotJoinable { .. })
    ));
    assert_eq!(engine.ledger().get_case(case).unwrap().stage(), CaseStage::Closed);
}

#[test]
fn deactivated_mediator_keeps_listing_but_leaves_random_pool() {
    let mut engine = MediationEngine::new(admin(), ledger_identity());
    let a = engine
        .registry_admin(&admin())
        .unwrap()
        .create_mediator(mediator_a())
        .unwrap();
    engine
        .registry_admin(&admin())
        .unwrap()
        .set_active(a, false)
        .unwrap();

    assert_eq!(
        engine.registry().mediators_by_category(Category(0)),
        vec![mediator_a().owner]
    );
    let case = engine
        .create_case(&Address::from_low_u64(0x10), Category(0), Amount::from_base_units(1))
        .unwrap();
    let mut rng = rand::thread_rng();
    assert!(matches!(
        engine.assign_random_mediator(case, &mut rng),
        Err(LedgerError::NoEligibleMediator { .. })
    ));
}
