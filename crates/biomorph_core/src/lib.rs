//! # Biomorph Core
//!
//! Simulation engine for the biomorph planet: integer genotypes develop into
//! branching line drawings, and populations of them breed, die and migrate
//! across regions that each favour a different body plan.
//!
//! This crate contains:
//! - The developmental engine (genotype → line segments, modes 1 to 5)
//! - Variation operators (point mutation, multi-parent crossover)
//! - Region definitions, fitness rules and the migration graph
//! - The per-region tick engine and the planet driver
//! - Configuration, census and metrics/logging
//!
//! ## Example
//!
//! ```
//! use biomorph_core::{develop, Atlas, Planet, PopulationConfig};
//! use biomorph_data::{Genotype, Mode};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let genotype = Genotype::new(Mode::Basic, vec![-1, 3, -1, -1, 2, 2, 2, 3, 5]).unwrap();
//! assert_eq!(develop(&genotype).len(), 31);
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut planet = Planet::seed_with_rng(Atlas::builtin(), PopulationConfig::default(), &mut rng);
//! planet.step_with_rng(&mut rng);
//! assert_eq!(planet.global_tick(), 1);
//! ```

/// Memoized phenotypes with LRU eviction
pub mod cache;
/// Configuration management for simulation parameters
pub mod config;
/// Genotype to phenotype development
pub mod develop;
/// Step counters and logging setup
pub mod metrics;
/// Multi-region driver
pub mod planet;
/// Per-region population state and tick engine
pub mod population;
/// Regions, fitness rules and adjacency
pub mod region;
/// Population census
pub mod stats;
/// Mutation, crossover and random genotypes
pub mod variation;

pub use cache::{CacheStats, PhenotypeCache};
pub use config::{CacheConfig, PopulationConfig, SimConfig};
pub use develop::{adapt, develop, develop_with, direction_vectors, DevelopmentOptions, Symmetry};
pub use metrics::{init_logging, Metrics};
pub use planet::Planet;
pub use population::{
    tick_region, DeferredMigrations, Delivery, MigrationSink, PendingMigration, PopulationState,
};
pub use region::{fitness_modifier, Atlas, FitnessRule, Region};
pub use stats::census;
pub use variation::{
    crossover_with_rng, mutate_with_rng, random_genotype_with_rng, random_interesting_with_rng,
    Crossover, GenotypeLogic,
};
