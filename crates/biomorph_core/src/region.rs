//! Selection environments, their fitness rules and the migration graph.
//!
//! A region's fitness rule maps a genotype to a mortality multiplier:
//! below 1.0 the organism is well adapted, above 1.0 poorly adapted.

use biomorph_data::{Genotype, RegionId, DEPTH_GENE};
use petgraph::algo::kosaraju_scc;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Divisor that turns `|gA| + |gB|` into the 0..1 spread/reach scale.
pub const SPREAD_NORMALIZATION: f64 = 18.0;

/// How a region turns a genotype into a mortality multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitnessRule {
    /// Depth at or below `threshold` gets `favored`; each level above adds
    /// `penalty_per_level` to 1.0.
    LowDepth {
        threshold: i32,
        favored: f64,
        penalty_per_level: f64,
    },
    /// Depth at or above `threshold` gets `favored`; each level below adds
    /// `penalty_per_level` to 1.0.
    HighDepth {
        threshold: i32,
        favored: f64,
        penalty_per_level: f64,
    },
    /// `base - (|g1|+|g3|)/18 * weight`.
    HorizontalSpread { base: f64, weight: f64 },
    /// `base - (|g5|+|g7|)/18 * weight`.
    VerticalReach { base: f64, weight: f64 },
    /// Always 1.0.
    Neutral,
}

impl FitnessRule {
    pub const SHALLOWS: FitnessRule = FitnessRule::LowDepth {
        threshold: 3,
        favored: 0.6,
        penalty_per_level: 0.25,
    };
    pub const CANOPY: FitnessRule = FitnessRule::HighDepth {
        threshold: 6,
        favored: 0.6,
        penalty_per_level: 0.3,
    };
    pub const STEPPE: FitnessRule = FitnessRule::HorizontalSpread {
        base: 1.5,
        weight: 0.8,
    };
    pub const DEPTHS: FitnessRule = FitnessRule::VerticalReach {
        base: 1.5,
        weight: 0.8,
    };

    /// Mortality multiplier for `genotype` under this rule.
    #[must_use]
    pub fn modifier(&self, genotype: &Genotype) -> f64 {
        let genes = genotype.genes();
        let depth = genes.get(DEPTH_GENE).copied().unwrap_or(1);
        match *self {
            FitnessRule::LowDepth {
                threshold,
                favored,
                penalty_per_level,
            } => {
                if depth <= threshold {
                    favored
                } else {
                    1.0 + (depth - threshold) as f64 * penalty_per_level
                }
            }
            FitnessRule::HighDepth {
                threshold,
                favored,
                penalty_per_level,
            } => {
                if depth >= threshold {
                    favored
                } else {
                    1.0 + (threshold - depth) as f64 * penalty_per_level
                }
            }
            FitnessRule::HorizontalSpread { base, weight } => {
                base - horizontal_spread(genotype) * weight
            }
            FitnessRule::VerticalReach { base, weight } => base - vertical_reach(genotype) * weight,
            FitnessRule::Neutral => 1.0,
        }
    }
}

/// `(|g1| + |g3|) / 18`.
#[must_use]
pub fn horizontal_spread(genotype: &Genotype) -> f64 {
    (genotype.gene(0).abs() + genotype.gene(2).abs()) as f64 / SPREAD_NORMALIZATION
}

/// `(|g5| + |g7|) / 18`.
#[must_use]
pub fn vertical_reach(genotype: &Genotype) -> f64 {
    (genotype.gene(4).abs() + genotype.gene(6).abs()) as f64 / SPREAD_NORMALIZATION
}

/// A named selection environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub selection_label: String,
    /// Regions reachable by migration.
    pub adjacent: Vec<RegionId>,
    pub rule: FitnessRule,
}

impl Region {
    /// Mortality multiplier for `genotype` in this region.
    #[must_use]
    pub fn fitness_modifier(&self, genotype: &Genotype) -> f64 {
        self.rule.modifier(genotype)
    }
}

fn validate_adjacency(regions: &[Region]) -> anyhow::Result<()> {
    anyhow::ensure!(!regions.is_empty(), "Atlas needs at least one region");

    let mut seen = HashSet::new();
    for region in regions {
        anyhow::ensure!(
            seen.insert(region.id.as_str()),
            "Duplicate region id '{}'",
            region.id
        );
    }

    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for region in regions {
        graph.add_node(region.id.as_str());
    }
    for region in regions {
        let mut targets = HashSet::new();
        for target in &region.adjacent {
            anyhow::ensure!(
                target != &region.id,
                "Region '{}' lists itself as adjacent",
                region.id
            );
            anyhow::ensure!(
                seen.contains(target.as_str()),
                "Region '{}' is adjacent to unknown region '{}'",
                region.id,
                target
            );
            anyhow::ensure!(
                targets.insert(target.as_str()),
                "Region '{}' lists '{}' twice",
                region.id,
                target
            );
            graph.add_edge(region.id.as_str(), target.as_str(), ());
        }
    }

    let components = kosaraju_scc(&graph).len();
    if components > 1 {
        tracing::warn!(
            components,
            "Migration graph is not strongly connected; some regions cannot be re-entered"
        );
    }
    Ok(())
}

fn builtin_region(
    id: &str,
    name: &str,
    description: &str,
    selection_label: &str,
    adjacent: &[&str],
    rule: FitnessRule,
) -> Region {
    Region {
        id: RegionId::from(id),
        name: name.to_string(),
        description: description.to_string(),
        selection_label: selection_label.to_string(),
        adjacent: adjacent.iter().map(|a| RegionId::from(*a)).collect(),
        rule,
    }
}

/// The ordered set of regions of one planet.
///
/// Order matters: the driver ticks regions in atlas order every global step.
#[derive(Debug, Clone, PartialEq)]
pub struct Atlas {
    regions: Vec<Region>,
}

impl Atlas {
    /// Validates and wraps a list of region definitions.
    ///
    /// Rejects an empty list, duplicate ids, self-adjacency and adjacency to
    /// unknown regions. A migration graph that is not strongly connected is
    /// allowed but logged, since some regions can then never be re-entered.
    pub fn new(regions: Vec<Region>) -> anyhow::Result<Self> {
        validate_adjacency(&regions)?;
        Ok(Self { regions })
    }

    /// The five regions of the planet: Shallows at the centre, Canopy,
    /// Steppe, Depths and Fringe around it.
    #[must_use]
    pub fn builtin() -> Self {
        let regions = vec![
            builtin_region(
                "shallows",
                "Shallows",
                "Warm, shallow waters favor simple forms.",
                "Favors depth 1-3",
                &["canopy", "steppe", "depths", "fringe"],
                FitnessRule::SHALLOWS,
            ),
            builtin_region(
                "canopy",
                "Canopy",
                "Dense canopy overhead. Complex branching catches the light.",
                "Favors depth 6-8",
                &["shallows", "steppe", "fringe"],
                FitnessRule::CANOPY,
            ),
            builtin_region(
                "steppe",
                "Steppe",
                "Open grasslands reward wide horizontal spread.",
                "Favors wide spread (|g1|+|g3|)",
                &["shallows", "canopy", "depths"],
                FitnessRule::STEPPE,
            ),
            builtin_region(
                "depths",
                "Depths",
                "Deep trenches. Tall vertical forms reach the nutrients above.",
                "Favors tall reach (|g5|+|g7|)",
                &["shallows", "steppe", "fringe"],
                FitnessRule::DEPTHS,
            ),
            builtin_region(
                "fringe",
                "Fringe",
                "The borderlands. A neutral mixing ground.",
                "No selection pressure",
                &["shallows", "canopy", "depths"],
                FitnessRule::Neutral,
            ),
        ];
        Self { regions }
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RegionId> {
        self.regions.iter().map(|r| &r.id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl Default for Atlas {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Mortality multiplier for `genotype` in the region `id`; unknown regions
/// are neutral.
#[must_use]
pub fn fitness_modifier(atlas: &Atlas, id: &RegionId, genotype: &Genotype) -> f64 {
    atlas
        .get(id)
        .map_or(1.0, |region| region.fitness_modifier(genotype))
}
