use crate::population::PopulationState;
use crate::region::{horizontal_spread, vertical_reach, Region};
use biomorph_data::PopulationStats;

/// Census of one region's population under that region's fitness rule.
#[must_use]
pub fn census(state: &PopulationState, region: &Region) -> PopulationStats {
    let mut stats = PopulationStats::empty(state.region().clone());
    stats.tick = state.tick_count();
    stats.migrations = state.migration_count();
    stats.population = state.len();

    if state.is_empty() {
        return stats;
    }

    let n = state.len() as f64;
    let mut depth_sum = 0.0;
    let mut spread_sum = 0.0;
    let mut reach_sum = 0.0;
    let mut age_sum = 0.0;
    let mut fitness_sum = 0.0;

    for c in state.creatures() {
        let genotype = c.genotype();
        let depth = genotype.depth();
        if let Some(slot) = usize::try_from(depth - 1)
            .ok()
            .and_then(|i| stats.depth_histogram.get_mut(i))
        {
            *slot += 1;
        }
        depth_sum += f64::from(depth);
        spread_sum += horizontal_spread(genotype);
        reach_sum += vertical_reach(genotype);
        age_sum += c.age as f64;
        fitness_sum += region.fitness_modifier(genotype);
        stats.max_generation = stats.max_generation.max(c.generation());
    }

    stats.mean_depth = depth_sum / n;
    stats.mean_spread = spread_sum / n;
    stats.mean_reach = reach_sum / n;
    stats.mean_age = age_sum / n;
    stats.mean_fitness_modifier = fitness_sum / n;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::spawn;
    use crate::region::Atlas;
    use biomorph_data::{Genotype, Mode, Position};

    #[test]
    fn test_empty_census() {
        let atlas = Atlas::builtin();
        let region = atlas.get(&"canopy".into()).unwrap();
        let stats = census(&PopulationState::new(region.id.clone()), region);
        assert_eq!(stats.population, 0);
        assert_eq!(stats.modal_depth(), None);
        assert_eq!(stats.mean_depth, 0.0);
    }

    #[test]
    fn test_census_means() {
        let atlas = Atlas::builtin();
        let region = atlas.get(&"canopy".into()).unwrap();
        let mut state = PopulationState::new(region.id.clone());
        let deep = Genotype::new(Mode::Basic, vec![3, 0, 3, 0, 0, 0, 0, 0, 7]).unwrap();
        let shallow = Genotype::new(Mode::Basic, vec![0, 0, 0, 0, 3, 0, 3, 0, 1]).unwrap();
        spawn(&mut state, deep.clone(), Position::new(0.5, 0.5), 10);
        spawn(&mut state, deep, Position::new(0.5, 0.5), 20);
        spawn(&mut state, shallow, Position::new(0.5, 0.5), 30);

        let stats = census(&state, region);
        assert_eq!(stats.population, 3);
        assert_eq!(stats.depth_histogram[6], 2);
        assert_eq!(stats.depth_histogram[0], 1);
        assert_eq!(stats.modal_depth(), Some(7));
        assert!((stats.mean_depth - 5.0).abs() < 1e-12);
        assert!((stats.mean_spread - 2.0 / 9.0).abs() < 1e-12);
        assert!((stats.mean_reach - 1.0 / 9.0).abs() < 1e-12);
        assert!((stats.mean_age - 20.0).abs() < 1e-12);
        // Canopy: depth 7 → 0.6, depth 1 → 1 + 5 * 0.3.
        assert!((stats.mean_fitness_modifier - (0.6 + 0.6 + 2.5) / 3.0).abs() < 1e-12);
    }
}
