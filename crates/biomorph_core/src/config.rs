//! Configuration management for simulation parameters.
//!
//! Strongly-typed configuration that maps onto a `config.toml` file. Every
//! field has a default, so a file only needs the values it overrides.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults)
//! 3. Command-line flags (applied by the binary)
//!
//! ## Example `config.toml`
//!
//! ```toml
//! seed = 42
//! log_interval = 100
//!
//! [population]
//! hard_cap = 80
//! soft_cap = 60
//! breed_chance = 0.05
//!
//! [cache]
//! phenotype_capacity = 1024
//! ```

use crate::region::{Atlas, Region};
use biomorph_data::Mode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-region population dynamics.
///
/// Defaults are the tuned values of the planet simulation; tests override
/// individual probabilities to force or suppress a phase.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    /// Genotype layout used for founders.
    pub mode: Mode,
    pub initial_population: usize,
    /// Above this size, mortality rises with density.
    pub soft_cap: usize,
    /// Population size is never allowed to exceed this.
    pub hard_cap: usize,
    pub breed_chance: f64,
    pub breed_radius: f64,
    /// Half-width of the box a newborn lands in around its parents' midpoint.
    pub offspring_jitter: f64,
    pub death_base_rate: f64,
    pub age_normalization: f64,
    /// Extra mortality multiplier reached at `hard_cap`.
    pub density_multiplier: f64,
    pub migration_edge: f64,
    pub migration_chance: f64,
    pub velocity_jitter: f64,
    pub damping: f64,
    pub bounce_min: f64,
    pub bounce_max: f64,
    pub bounce_restitution: f64,
    /// Migrants arrive uniformly in `[arrival_min, arrival_min + arrival_span]`.
    pub arrival_min: f64,
    pub arrival_span: f64,
    /// Founders are placed uniformly in `[seed_min, seed_min + seed_span]`.
    pub seed_min: f64,
    pub seed_span: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Basic,
            initial_population: 35,
            soft_cap: 50,
            hard_cap: 60,
            breed_chance: 0.03,
            breed_radius: 0.08,
            offspring_jitter: 0.03,
            death_base_rate: 0.001,
            age_normalization: 600.0,
            density_multiplier: 3.0,
            migration_edge: 0.05,
            migration_chance: 0.005,
            velocity_jitter: 0.002,
            damping: 0.95,
            bounce_min: 0.02,
            bounce_max: 0.98,
            bounce_restitution: 0.5,
            arrival_min: 0.4,
            arrival_span: 0.2,
            seed_min: 0.1,
            seed_span: 0.8,
        }
    }
}

impl PopulationConfig {
    /// Mortality multiplier from crowding.
    #[must_use]
    pub fn density_factor(&self, population: usize) -> f64 {
        if population <= self.soft_cap {
            1.0
        } else {
            1.0 + (population - self.soft_cap) as f64 / (self.hard_cap - self.soft_cap) as f64
                * self.density_multiplier
        }
    }

    /// Mortality multiplier from age: `(age / age_normalization)^2`.
    #[must_use]
    pub fn age_factor(&self, age: u64) -> f64 {
        (age as f64 / self.age_normalization).powi(2)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of developed phenotypes kept in memory.
    pub phenotype_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            phenotype_capacity: 512,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Master RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Global steps between census log lines.
    pub log_interval: u64,
    pub population: PopulationConfig,
    pub cache: CacheConfig,
    /// Custom region definitions. Empty means the five built-in regions.
    pub regions: Vec<Region>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: None,
            log_interval: 100,
            population: PopulationConfig::default(),
            cache: CacheConfig::default(),
            regions: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a present but invalid file is an
    /// error rather than a silent fallback.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The region atlas this configuration describes.
    pub fn atlas(&self) -> anyhow::Result<Atlas> {
        if self.regions.is_empty() {
            Ok(Atlas::builtin())
        } else {
            Atlas::new(self.regions.clone())
        }
    }

    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        let p = &self.population;
        anyhow::ensure!(p.hard_cap > 0, "Hard cap must be positive");
        anyhow::ensure!(
            p.soft_cap < p.hard_cap,
            "Soft cap ({}) must be below hard cap ({})",
            p.soft_cap,
            p.hard_cap
        );
        anyhow::ensure!(
            p.initial_population <= p.hard_cap,
            "Initial population ({}) exceeds hard cap ({})",
            p.initial_population,
            p.hard_cap
        );
        for (name, value) in [
            ("breed_chance", p.breed_chance),
            ("death_base_rate", p.death_base_rate),
            ("migration_chance", p.migration_chance),
            ("damping", p.damping),
            ("bounce_restitution", p.bounce_restitution),
        ] {
            anyhow::ensure!(
                (0.0..=1.0).contains(&value),
                "{} must be in [0, 1], got {}",
                name,
                value
            );
        }
        anyhow::ensure!(p.breed_radius >= 0.0, "Breed radius must be non-negative");
        anyhow::ensure!(
            p.age_normalization > 0.0,
            "Age normalization must be positive"
        );
        anyhow::ensure!(
            p.density_multiplier >= 0.0,
            "Density multiplier must be non-negative"
        );
        anyhow::ensure!(
            0.0 <= p.bounce_min && p.bounce_min < p.bounce_max && p.bounce_max <= 1.0,
            "Bounce range must satisfy 0 <= min < max <= 1"
        );
        anyhow::ensure!(
            (0.0..0.5).contains(&p.migration_edge),
            "Migration edge must be in [0, 0.5)"
        );
        anyhow::ensure!(
            p.arrival_min >= 0.0 && p.arrival_min + p.arrival_span <= 1.0,
            "Arrival box must lie inside the unit square"
        );
        anyhow::ensure!(
            p.seed_min >= 0.0 && p.seed_min + p.seed_span <= 1.0,
            "Seed box must lie inside the unit square"
        );
        anyhow::ensure!(
            self.cache.phenotype_capacity > 0,
            "Phenotype cache capacity must be positive"
        );
        anyhow::ensure!(self.log_interval > 0, "Log interval must be positive");
        self.atlas()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_constants() {
        let p = PopulationConfig::default();
        assert_eq!(p.initial_population, 35);
        assert_eq!(p.soft_cap, 50);
        assert_eq!(p.hard_cap, 60);
        assert_eq!(p.breed_chance, 0.03);
        assert_eq!(p.breed_radius, 0.08);
        assert_eq!(p.death_base_rate, 0.001);
        assert_eq!(p.age_normalization, 600.0);
        assert_eq!(p.migration_edge, 0.05);
        assert_eq!(p.migration_chance, 0.005);
    }

    #[test]
    fn test_density_factor() {
        let p = PopulationConfig::default();
        assert_eq!(p.density_factor(0), 1.0);
        assert_eq!(p.density_factor(50), 1.0);
        assert!((p.density_factor(55) - 2.5).abs() < 1e-12);
        assert!((p.density_factor(60) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_age_factor() {
        let p = PopulationConfig::default();
        assert_eq!(p.age_factor(0), 0.0);
        assert_eq!(p.age_factor(600), 1.0);
        assert_eq!(p.age_factor(1200), 4.0);
    }

    #[test]
    fn test_soft_cap_must_be_below_hard_cap() {
        let config = SimConfig {
            population: PopulationConfig {
                soft_cap: 60,
                hard_cap: 60,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probability_out_of_range() {
        let config = SimConfig {
            population: PopulationConfig {
                migration_chance: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config: SimConfig = toml::from_str(
            r#"
            seed = 7

            [population]
            hard_cap = 80
            soft_cap = 70
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.population.hard_cap, 80);
        assert_eq!(config.population.initial_population, 35);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SimConfig::default();
        let text = config.to_toml().unwrap();
        let back: SimConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = SimConfig::load("/nonexistent/biomorph/config.toml").unwrap();
        assert_eq!(config, SimConfig::default());
    }
}
