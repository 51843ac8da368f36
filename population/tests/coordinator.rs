use std::time::Duration;

use horde_core::{Event, SpawnerId, VariantId};
use horde_population::{query, CompletionPolicy, Coordinator, LevelPhase, LimitStatus, Registration};

fn settler() -> VariantId {
    VariantId::new("Settler1")
}

fn coordinator_with(capacity: u32, maximum: u32) -> Coordinator {
    let mut coordinator = Coordinator::default();
    assert_eq!(
        coordinator.register_limit(settler(), capacity, maximum),
        Registration::Inserted
    );
    coordinator
}

#[test]
fn capacity_gate_and_maximum_ratchet_scenario() {
    let variant = settler();
    let mut coordinator = coordinator_with(2, 3);
    let mut events = Vec::new();

    coordinator.on_spawned(&variant, &mut events);
    assert_eq!(query::global_alive(&coordinator, &variant), 1);
    assert_eq!(query::global_spawned(&coordinator, &variant), 1);
    assert!(coordinator.can_spawn(&variant));

    coordinator.on_spawned(&variant, &mut events);
    assert_eq!(query::global_alive(&coordinator, &variant), 2);
    assert_eq!(query::global_spawned(&coordinator, &variant), 2);
    assert!(!coordinator.can_spawn(&variant), "capacity gate closed");

    coordinator.on_died(&variant, &mut events);
    assert_eq!(query::global_alive(&coordinator, &variant), 1);
    assert!(coordinator.can_spawn(&variant), "capacity gate reopened");

    coordinator.on_spawned(&variant, &mut events);
    assert_eq!(query::global_alive(&coordinator, &variant), 2);
    assert_eq!(query::global_spawned(&coordinator, &variant), 3);
    assert!(!coordinator.can_spawn(&variant), "maximum reached");

    coordinator.on_died(&variant, &mut events);
    assert!(!coordinator.can_spawn(&variant), "maximum is a ratchet");
    assert!(!coordinator.is_level_complete());

    coordinator.on_died(&variant, &mut events);
    assert_eq!(query::global_alive(&coordinator, &variant), 0);
    assert!(!coordinator.can_spawn(&variant), "maximum is a ratchet");
    assert!(coordinator.is_level_complete());
    assert_eq!(coordinator.phase(), LevelPhase::Complete);

    assert_eq!(
        events,
        vec![
            Event::GlobalCapacityReached {
                variant: variant.clone(),
            },
            Event::GlobalCapacityFreed {
                variant: variant.clone(),
            },
            Event::GlobalMaximumReached {
                variant: variant.clone(),
            },
            Event::GlobalCapacityReached {
                variant: variant.clone(),
            },
            Event::AllMaximumsReached,
            Event::GlobalCapacityFreed { variant },
            Event::SpawnersRetired {
                spawners: Vec::new(),
            },
        ]
    );
}

#[test]
fn unregistered_variants_are_denied_and_ignored() {
    let mut coordinator = coordinator_with(2, 3);
    let stranger = VariantId::new("Settler10");
    let mut events = Vec::new();

    assert!(!coordinator.can_spawn(&stranger));
    coordinator.on_spawned(&stranger, &mut events);
    coordinator.on_died(&stranger, &mut events);

    assert!(events.is_empty());
    assert!(query::limit(&coordinator, &stranger).is_none());
    assert_eq!(query::global_alive(&coordinator, &stranger), 0);
    assert_eq!(query::global_maximum(&coordinator, &stranger), 0);
}

#[test]
fn registration_is_idempotent() {
    let variant = settler();
    let mut coordinator = coordinator_with(2, 3);
    let mut events = Vec::new();
    coordinator.on_spawned(&variant, &mut events);

    assert_eq!(
        coordinator.register_limit(variant.clone(), 10, 50),
        Registration::AlreadyRegistered
    );
    assert_eq!(query::global_capacity(&coordinator, &variant), 2);
    assert_eq!(query::global_maximum(&coordinator, &variant), 3);
    assert_eq!(query::global_spawned(&coordinator, &variant), 1);
}

#[test]
fn registration_clamps_capacity_to_maximum() {
    let variant = settler();
    let coordinator = coordinator_with(9, 4);
    assert_eq!(query::global_capacity(&coordinator, &variant), 4);
    assert_eq!(query::global_maximum(&coordinator, &variant), 4);
}

#[test]
fn level_stays_active_while_any_variant_is_alive() {
    let first = settler();
    let second = VariantId::new("Settler2");
    let mut coordinator = coordinator_with(1, 1);
    let _ = coordinator.register_limit(second.clone(), 1, 1);
    let mut events = Vec::new();

    coordinator.on_spawned(&first, &mut events);
    coordinator.on_spawned(&second, &mut events);
    coordinator.on_died(&first, &mut events);

    assert!(query::is_global_maximum_reached(&coordinator, &first));
    assert!(query::is_global_maximum_reached(&coordinator, &second));
    assert!(!coordinator.is_level_complete(), "second variant still alive");

    coordinator.on_died(&second, &mut events);
    assert!(coordinator.is_level_complete());
}

#[test]
fn level_stays_active_until_every_variant_spends_its_budget() {
    let first = settler();
    let second = VariantId::new("Settler2");
    let mut coordinator = coordinator_with(1, 1);
    let _ = coordinator.register_limit(second, 1, 2);
    let mut events = Vec::new();

    coordinator.on_spawned(&first, &mut events);
    coordinator.on_died(&first, &mut events);

    assert!(!coordinator.is_level_complete());
    assert!(!events.contains(&Event::AllMaximumsReached));
}

#[test]
fn spawners_retire_after_delay_once_budgets_are_spent() {
    let variant = settler();
    let mut coordinator = Coordinator::new(CompletionPolicy::new(true, Duration::from_secs(2)));
    let _ = coordinator.register_limit(variant.clone(), 2, 2);
    coordinator.register_spawner(SpawnerId::new(1));
    coordinator.register_spawner(SpawnerId::new(0));
    let mut events = Vec::new();

    coordinator.advance(Duration::from_secs(5), &mut events);
    coordinator.on_spawned(&variant, &mut events);
    coordinator.on_spawned(&variant, &mut events);
    assert!(events.contains(&Event::AllMaximumsReached));
    assert!(!coordinator.spawners_retired());

    events.clear();
    coordinator.advance(Duration::from_millis(6_500), &mut events);
    assert!(events.is_empty(), "retirement waits for the delay");

    coordinator.advance(Duration::from_secs(7), &mut events);
    assert_eq!(
        events,
        vec![Event::SpawnersRetired {
            spawners: vec![SpawnerId::new(0), SpawnerId::new(1)],
        }]
    );
    assert!(coordinator.spawners_retired());

    events.clear();
    coordinator.advance(Duration::from_secs(20), &mut events);
    coordinator.on_died(&variant, &mut events);
    coordinator.on_died(&variant, &mut events);
    assert!(coordinator.is_level_complete());
    assert!(
        !events.iter().any(|event| matches!(event, Event::SpawnersRetired { .. })),
        "spawners are retired exactly once"
    );
}

#[test]
fn completion_before_delay_retires_immediately() {
    let variant = settler();
    let mut coordinator = Coordinator::new(CompletionPolicy::new(true, Duration::from_secs(30)));
    let _ = coordinator.register_limit(variant.clone(), 1, 1);
    coordinator.register_spawner(SpawnerId::new(3));
    let mut events = Vec::new();

    coordinator.on_spawned(&variant, &mut events);
    coordinator.on_died(&variant, &mut events);

    assert!(coordinator.is_level_complete());
    assert_eq!(
        events.last(),
        Some(&Event::SpawnersRetired {
            spawners: vec![SpawnerId::new(3)],
        })
    );

    events.clear();
    coordinator.advance(Duration::from_secs(60), &mut events);
    assert!(events.is_empty());
}

#[test]
fn disabled_retirement_never_retires() {
    let variant = settler();
    let mut coordinator = Coordinator::new(CompletionPolicy::new(false, Duration::ZERO));
    let _ = coordinator.register_limit(variant.clone(), 1, 1);
    coordinator.register_spawner(SpawnerId::new(0));
    let mut events = Vec::new();

    coordinator.on_spawned(&variant, &mut events);
    coordinator.on_died(&variant, &mut events);
    coordinator.advance(Duration::from_secs(60), &mut events);

    assert!(coordinator.is_level_complete());
    assert!(!coordinator.spawners_retired());
    assert!(!events.iter().any(|event| matches!(event, Event::SpawnersRetired { .. })));
}

#[test]
fn unregistered_spawners_are_not_retired() {
    let variant = settler();
    let mut coordinator = coordinator_with(1, 1);
    coordinator.register_spawner(SpawnerId::new(0));
    coordinator.register_spawner(SpawnerId::new(1));
    coordinator.unregister_spawner(SpawnerId::new(0));
    let mut events = Vec::new();

    coordinator.on_spawned(&variant, &mut events);
    coordinator.on_died(&variant, &mut events);

    assert_eq!(query::spawners(&coordinator), vec![SpawnerId::new(1)]);
    assert_eq!(
        events.last(),
        Some(&Event::SpawnersRetired {
            spawners: vec![SpawnerId::new(1)],
        })
    );
}

#[test]
fn lowering_capacity_at_runtime_clamps_instead_of_failing() {
    let variant = settler();
    let mut coordinator = coordinator_with(3, 10);
    let mut events = Vec::new();
    for _ in 0..3 {
        coordinator.on_spawned(&variant, &mut events);
    }

    assert!(coordinator.set_global_capacity(&variant, 1));
    assert_eq!(query::global_alive(&coordinator, &variant), 3);
    assert!(!coordinator.can_spawn(&variant));

    coordinator.on_died(&variant, &mut events);
    assert!(!coordinator.can_spawn(&variant), "two alive against capacity one");
    coordinator.on_died(&variant, &mut events);
    coordinator.on_died(&variant, &mut events);
    assert!(coordinator.can_spawn(&variant));

    assert!(!coordinator.set_global_capacity(&VariantId::new("Settler2"), 4));
}

#[test]
fn overlay_status_tracks_gates() {
    let variant = settler();
    let mut coordinator = coordinator_with(1, 2);
    let mut events = Vec::new();

    let status = |coordinator: &Coordinator| {
        query::limit(coordinator, &settler())
            .map(|limit| limit.status())
            .expect("limit registered")
    };

    assert_eq!(status(&coordinator), LimitStatus::Open);
    coordinator.on_spawned(&variant, &mut events);
    assert_eq!(status(&coordinator), LimitStatus::AtCapacity);
    coordinator.on_died(&variant, &mut events);
    coordinator.on_spawned(&variant, &mut events);
    assert_eq!(status(&coordinator), LimitStatus::Exhausted);
    assert_eq!(query::limits(&coordinator).count(), 1);
}
