use horde_core::VariantId;
use horde_population::{query, Coordinator};
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Step {
    Spawn,
    Die,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![Just(Step::Spawn), Just(Step::Die)]
}

proptest! {
    #[test]
    fn counters_stay_ordered_for_any_event_sequence(
        capacity in 1u32..6,
        maximum in 1u32..12,
        steps in prop::collection::vec(step(), 0..64),
    ) {
        let variant = VariantId::new("Settler1");
        let mut coordinator = Coordinator::default();
        let _ = coordinator.register_limit(variant.clone(), capacity, maximum);
        let mut events = Vec::new();
        let mut exhausted = false;

        for step in steps {
            match step {
                Step::Spawn => coordinator.on_spawned(&variant, &mut events),
                Step::Die => coordinator.on_died(&variant, &mut events),
            }

            let limit = query::limit(&coordinator, &variant).expect("limit registered");
            prop_assert!(limit.alive() <= limit.spawned());
            prop_assert!(limit.spawned() <= limit.maximum());

            if limit.has_reached_maximum() {
                exhausted = true;
            }
            if exhausted {
                prop_assert!(!coordinator.can_spawn(&variant), "maximum must ratchet");
            }
            if limit.alive() > 0 {
                prop_assert!(!coordinator.is_level_complete());
            }
        }
    }

    #[test]
    fn admission_respects_both_gates(
        capacity in 1u32..6,
        maximum in 1u32..12,
        attempts in 0usize..40,
    ) {
        let variant = VariantId::new("Settler2");
        let mut coordinator = Coordinator::default();
        let _ = coordinator.register_limit(variant.clone(), capacity, maximum);
        let mut events = Vec::new();

        for _ in 0..attempts {
            if coordinator.can_spawn(&variant) {
                coordinator.on_spawned(&variant, &mut events);
            }
            let limit = query::limit(&coordinator, &variant).expect("limit registered");
            prop_assert!(limit.alive() <= limit.capacity());
        }

        let expected = u32::try_from(attempts).unwrap_or(u32::MAX).min(capacity.min(maximum));
        prop_assert_eq!(query::global_spawned(&coordinator, &variant), expected);
    }
}
