mod common;

use biomorph_data::{CreatureId, EventKind, LifecycleEvent, RegionId};
use common::{genotype_with_depth, two_region_atlas, PlanetBuilder};

fn still_builder(seed: u64) -> PlanetBuilder {
    PlanetBuilder::new()
        .with_seed(seed)
        .with_atlas(two_region_atlas())
        .with_config(|c| {
            c.breed_chance = 0.0;
            c.death_base_rate = 0.0;
            c.migration_chance = 1.0;
            c.velocity_jitter = 0.0;
        })
}

#[test]
fn test_migrant_into_later_region_ticks_again() {
    let (mut planet, mut rng) = still_builder(1)
        .with_creature("a", genotype_with_depth(4, 1), 0.02, 0.5, 10)
        .build();

    let events = planet.step_with_rng(&mut rng);
    assert_eq!(events.len(), 1);
    let LifecycleEvent::Migration { from, to, arrival, creature } = &events[0] else {
        panic!("expected a migration, got {:?}", events[0]);
    };
    assert_eq!(from, &RegionId::from("a"));
    assert_eq!(to, &RegionId::from("b"));
    assert_eq!(arrival, &CreatureId::new(RegionId::from("b"), 1));
    assert_eq!(creature.age, 11);

    let a = planet.state(&RegionId::from("a")).unwrap();
    let b = planet.state(&RegionId::from("b")).unwrap();
    assert!(a.is_empty());
    assert_eq!(a.migration_count(), 1);
    let migrant = b.get(arrival).unwrap();
    // Moved in `a`, then again as a resident of `b`.
    assert_eq!(migrant.age, 12);
    assert_eq!(migrant.genotype(), creature.genotype());
    assert!((0.4..=0.6).contains(&migrant.position.x));
    assert_eq!(planet.total_migrations(), 1);
}

#[test]
fn test_migrant_into_earlier_region_waits_a_step() {
    let (mut planet, mut rng) = still_builder(2)
        .with_creature("b", genotype_with_depth(4, 1), 0.5, 0.98, 10)
        .build();

    let events = planet.step_with_rng(&mut rng);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::Migration);

    let a = planet.state(&RegionId::from("a")).unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(a.creatures()[0].age, 11);
    assert!(planet.state(&RegionId::from("b")).unwrap().is_empty());

    planet.step_with_rng(&mut rng);
    let a = planet.state(&RegionId::from("a")).unwrap();
    assert_eq!(a.creatures()[0].age, 12);
}

#[test]
fn test_migrant_keeps_lineage() {
    let (mut planet, mut rng) = still_builder(3)
        .with_creature("a", genotype_with_depth(6, 2), 0.02, 0.02, 40)
        .build();

    let events = planet.step_with_rng(&mut rng);
    let LifecycleEvent::Migration { creature, arrival, .. } = &events[0] else {
        panic!("expected a migration");
    };
    let migrant = planet
        .state(&RegionId::from("b"))
        .and_then(|s| s.get(arrival))
        .unwrap();
    assert_eq!(migrant.generation(), creature.generation());
    assert_eq!(migrant.parents(), creature.parents());
    assert_ne!(migrant.id(), creature.id());
}

#[test]
fn test_full_destination_declines_migrant() {
    let mut builder = still_builder(4)
        .with_config(|c| {
            c.hard_cap = 3;
            c.soft_cap = 2;
        })
        .with_creature("a", genotype_with_depth(4, 1), 0.02, 0.5, 0);
    for _ in 0..3 {
        builder = builder.with_creature("b", genotype_with_depth(4, 1), 0.5, 0.5, 0);
    }
    let (mut planet, mut rng) = builder.build();

    let events = planet.step_with_rng(&mut rng);
    assert!(events.is_empty());
    assert_eq!(planet.state(&RegionId::from("a")).unwrap().len(), 1);
    assert_eq!(planet.state(&RegionId::from("b")).unwrap().len(), 3);
    assert_eq!(planet.total_migrations(), 0);
}

#[test]
fn test_parallel_step_respects_cap() {
    let (mut planet, mut rng) = PlanetBuilder::new()
        .with_seed(5)
        .with_config(|c| {
            c.breed_chance = 0.5;
            c.breed_radius = 0.4;
            c.migration_chance = 0.5;
            c.migration_edge = 0.3;
        })
        .seeded()
        .build();

    let mut migrations = 0;
    for _ in 0..150 {
        let events = planet.step_parallel_with_rng(&mut rng);
        migrations += events.iter().filter(|e| e.is_migration()).count();
        for state in planet.states() {
            assert!(state.len() <= 60, "{} holds {}", state.region(), state.len());
        }
        let problems = planet.check_invariants();
        assert!(problems.is_empty(), "{problems:?}");
    }
    assert!(migrations > 0);
    assert_eq!(planet.total_migrations(), migrations as u64);
}

#[test]
fn test_parallel_step_is_reproducible() {
    let run = || {
        let (mut planet, mut rng) = PlanetBuilder::new().with_seed(6).seeded().build();
        for _ in 0..50 {
            planet.step_parallel_with_rng(&mut rng);
        }
        planet
            .states()
            .map(|s| (s.len(), s.next_id(), s.migration_count()))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
