mod common;

use biomorph_core::FitnessRule;
use biomorph_data::EventKind;
use common::{genotype_with_depth, single_region_atlas, PlanetBuilder};

/// Deaths among (deep, shallow) creatures over one step of a canopy region
/// holding 20 of each.
fn canopy_deaths(seed: u64) -> (usize, usize) {
    let mut builder = PlanetBuilder::new()
        .with_seed(seed)
        .with_atlas(single_region_atlas("canopy", FitnessRule::CANOPY))
        .with_config(|c| {
            c.breed_chance = 0.0;
            c.migration_chance = 0.0;
            c.death_base_rate = 1.0;
        });
    for i in 0..20 {
        let x = 0.1 + 0.04 * i as f64;
        builder = builder
            .with_creature("canopy", genotype_with_depth(7, 2), x, 0.3, 300)
            .with_creature("canopy", genotype_with_depth(1, 2), x, 0.7, 300);
    }
    let (mut planet, mut rng) = builder.build();

    let events = planet.step_with_rng(&mut rng);
    let mut deep = 0;
    let mut shallow = 0;
    for event in events.iter().filter(|e| e.kind() == EventKind::Death) {
        match event.creature().genotype().depth() {
            7 => deep += 1,
            1 => shallow += 1,
            d => panic!("unexpected depth {d}"),
        }
    }
    (deep, shallow)
}

#[test]
fn test_canopy_kills_shallow_forms_faster() {
    let mut deep = 0;
    let mut shallow = 0;
    for seed in 0..30 {
        let (d, s) = canopy_deaths(seed);
        deep += d;
        shallow += s;
    }
    // Expected rates are roughly 0.15 and 0.63 per creature.
    assert!(
        shallow > deep * 2,
        "shallow deaths {shallow} not well above deep deaths {deep}"
    );
}

#[test]
fn test_neutral_region_does_not_discriminate() {
    let mut builder = PlanetBuilder::new()
        .with_seed(11)
        .with_atlas(single_region_atlas("fringe", FitnessRule::Neutral))
        .with_config(|c| {
            c.breed_chance = 0.0;
            c.migration_chance = 0.0;
        });
    for i in 0..10 {
        let x = 0.1 + 0.08 * i as f64;
        builder = builder
            .with_creature("fringe", genotype_with_depth(8, 3), x, 0.3, 0)
            .with_creature("fringe", genotype_with_depth(1, 0), x, 0.7, 0);
    }
    let (planet, _) = builder.build();
    let region = planet.atlas().regions()[0].clone();
    for state in planet.states() {
        for c in state.creatures() {
            assert_eq!(region.fitness_modifier(c.genotype()), 1.0);
        }
    }
}
