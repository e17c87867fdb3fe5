use biomorph_core::develop::tree_segment_count;
use biomorph_core::{crossover_with_rng, develop, mutate_with_rng, Planet, PopulationConfig};
use biomorph_core::Atlas;
use biomorph_data::{Genotype, Mode};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop::sample::select(Mode::ALL.to_vec())
}

fn arb_genotype_for(mode: Mode) -> impl Strategy<Value = Genotype> {
    let ranges: Vec<_> = mode.bounds().iter().map(|b| b.min..=b.max).collect();
    ranges.prop_map(move |genes| Genotype::new(mode, genes).unwrap())
}

fn arb_genotype() -> impl Strategy<Value = Genotype> {
    arb_mode().prop_flat_map(arb_genotype_for)
}

prop_compose! {
    fn arb_basic()(genes in arb_genotype_for(Mode::Basic)) -> Genotype {
        genes
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn mutation_stays_in_bounds(genotype in arb_genotype(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut current = genotype;
        for _ in 0..20 {
            let next = mutate_with_rng(&current, &mut rng);
            prop_assert!(next.is_within_bounds());
            prop_assert_eq!(next.mode(), current.mode());
            let steps: Vec<i32> = next
                .genes()
                .iter()
                .zip(current.genes())
                .filter(|(a, b)| a != b)
                .map(|(a, b)| a - b)
                .collect();
            prop_assert!(steps.len() <= 1);
            for step in steps {
                prop_assert_eq!(step.abs(), 1);
            }
            current = next;
        }
    }

    #[test]
    fn crossover_genes_come_from_named_parent(
        parents in prop::collection::vec(arb_genotype(), 1..5),
        seed in any::<u64>()
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let refs: Vec<&Genotype> = parents.iter().collect();
        let child = crossover_with_rng(&refs, &mut rng).unwrap();
        prop_assert_eq!(child.genotype.mode(), parents[0].mode());
        prop_assert_eq!(child.genotype.len(), parents[0].len());
        prop_assert_eq!(child.sources.len(), child.genotype.len());
        for (index, source) in child.sources.iter().enumerate() {
            let donor = &parents[usize::from(*source) - 1];
            prop_assert!(index < donor.len());
            prop_assert_eq!(child.genotype.gene(index), donor.gene(index));
        }
    }

    #[test]
    fn basic_tree_has_full_binary_segment_count(genotype in arb_basic()) {
        let depth = genotype.depth() as u32;
        prop_assert_eq!(develop(&genotype).len(), tree_segment_count(depth));
    }

    #[test]
    fn development_is_deterministic(genotype in arb_genotype()) {
        prop_assert_eq!(develop(&genotype), develop(&genotype));
    }

    #[test]
    fn population_never_exceeds_cap(seed in any::<u64>(), breed in 0.0f64..1.0, migrate in 0.0f64..1.0) {
        let config = PopulationConfig {
            breed_chance: breed,
            breed_radius: 0.3,
            migration_chance: migrate,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut planet = Planet::seed_with_rng(Atlas::builtin(), config, &mut rng);
        for _ in 0..20 {
            planet.step_with_rng(&mut rng);
            for state in planet.states() {
                prop_assert!(state.len() <= 60);
            }
        }
        prop_assert!(planet.check_invariants().is_empty());
    }
}
