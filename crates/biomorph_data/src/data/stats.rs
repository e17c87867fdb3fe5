use super::region::RegionId;
use serde::{Deserialize, Serialize};

/// Census of one region's population at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub region: RegionId,
    pub tick: u64,
    pub population: usize,
    /// Counts of creatures by depth gene, index 0 = depth 1.
    pub depth_histogram: [usize; 8],
    pub mean_depth: f64,
    /// Mean of `(|g1|+|g3|)/18`.
    pub mean_spread: f64,
    /// Mean of `(|g5|+|g7|)/18`.
    pub mean_reach: f64,
    pub mean_age: f64,
    pub max_generation: u32,
    /// Mean mortality multiplier of the population under the region's rule.
    pub mean_fitness_modifier: f64,
    pub migrations: u64,
}

impl PopulationStats {
    #[must_use]
    pub fn empty(region: RegionId) -> Self {
        Self {
            region,
            tick: 0,
            population: 0,
            depth_histogram: [0; 8],
            mean_depth: 0.0,
            mean_spread: 0.0,
            mean_reach: 0.0,
            mean_age: 0.0,
            max_generation: 0,
            mean_fitness_modifier: 0.0,
            migrations: 0,
        }
    }

    /// Most common depth gene, `None` for an empty population.
    #[must_use]
    pub fn modal_depth(&self) -> Option<i32> {
        if self.population == 0 {
            return None;
        }
        self.depth_histogram
            .iter()
            .enumerate()
            .max_by_key(|(i, count)| (**count, std::cmp::Reverse(*i)))
            .map(|(i, _)| i as i32 + 1)
    }
}
