//! Headless application: a seeded planet, its RNG, the history log and a
//! phenotype cache for census reports.

use anyhow::Result;
use biomorph_core::{Metrics, PhenotypeCache, Planet, SimConfig};
use biomorph_data::{LifecycleEvent, PopulationStats};
use biomorph_io::{load_rkyv, load_snapshot, save_rkyv, save_snapshot, HistoryLogger, PlanetSnapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Census of one region plus the mean phenotype size of its creatures.
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub name: String,
    pub stats: PopulationStats,
    pub mean_segments: f64,
}

impl fmt::Display for RegionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modal = self
            .stats
            .modal_depth()
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        write!(
            f,
            "{:<10} pop {:>3}  depth {:>4.2} (mode {})  segs {:>6.1}  spread {:.2}  reach {:.2}  gen {:>4}  out {:>4}",
            self.name,
            self.stats.population,
            self.stats.mean_depth,
            modal,
            self.mean_segments,
            self.stats.mean_spread,
            self.stats.mean_reach,
            self.stats.max_generation,
            self.stats.migrations
        )
    }
}

pub struct App {
    pub planet: Planet,
    pub config: SimConfig,
    rng: ChaCha8Rng,
    history: HistoryLogger,
    cache: PhenotypeCache,
    parallel: bool,
}

fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn is_rkyv(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rkyv")
}

impl App {
    /// Seeds a fresh planet from `config`.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = make_rng(config.seed);
        let metrics = Arc::new(Metrics::new(config.log_interval));
        let planet = Planet::seed_with_rng(config.atlas()?, config.population.clone(), &mut rng)
            .with_metrics(metrics);
        Ok(Self::assemble(config, planet, rng))
    }

    /// Resumes a saved planet. Files ending in `.rkyv` are read as rkyv,
    /// anything else as checksummed gzip JSON.
    pub fn load<P: AsRef<Path>>(config: SimConfig, path: P) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let snapshot: PlanetSnapshot = if is_rkyv(path) {
            load_rkyv(path)?
        } else {
            load_snapshot(path)?
        };
        let metrics = Arc::new(Metrics::new(config.log_interval));
        let planet = snapshot
            .restore(config.atlas()?, config.population.clone())?
            .with_metrics(metrics);
        tracing::info!(
            path = %path.display(),
            tick = planet.global_tick(),
            population = planet.population(),
            "Resumed planet"
        );
        let rng = make_rng(config.seed);
        Ok(Self::assemble(config, planet, rng))
    }

    fn assemble(config: SimConfig, planet: Planet, rng: ChaCha8Rng) -> Self {
        let cache = PhenotypeCache::new(config.cache.phenotype_capacity);
        Self {
            planet,
            config,
            rng,
            history: HistoryLogger::new_dummy(),
            cache,
            parallel: false,
        }
    }

    /// Records every lifecycle event under `dir`.
    pub fn with_history<P: AsRef<Path>>(mut self, dir: P) -> Result<Self> {
        self.history = HistoryLogger::new_at(dir)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Advances the planet one global step.
    pub fn step(&mut self) -> Result<Vec<LifecycleEvent>> {
        let events = if self.parallel {
            self.planet.step_parallel_with_rng(&mut self.rng)
        } else {
            self.planet.step_with_rng(&mut self.rng)
        };
        self.history.log_events(self.planet.global_tick(), &events)?;
        Ok(events)
    }

    /// Runs up to `steps` global steps, logging a census every
    /// `log_interval`. Stops early if every region has died out.
    pub fn run(&mut self, steps: u64) -> Result<()> {
        for _ in 0..steps {
            self.step()?;
            if self.planet.global_tick() % self.config.log_interval == 0 {
                self.log_census();
            }
            if self.planet.population() == 0 {
                tracing::warn!(tick = self.planet.global_tick(), "Planet is empty, stopping");
                break;
            }
        }
        Ok(())
    }

    /// Per-region census in atlas order.
    pub fn census_report(&mut self) -> Vec<RegionReport> {
        let stats = self.planet.census();
        let mut reports = Vec::with_capacity(stats.len());
        for stats in stats {
            let Some(state) = self.planet.state(&stats.region) else {
                continue;
            };
            let name = self
                .planet
                .atlas()
                .get(&stats.region)
                .map_or_else(|| stats.region.to_string(), |r| r.name.clone());
            let total: usize = state
                .creatures()
                .iter()
                .map(|c| self.cache.phenotype(c.genotype()).len())
                .sum();
            let mean_segments = if state.is_empty() {
                0.0
            } else {
                total as f64 / state.len() as f64
            };
            reports.push(RegionReport {
                name,
                stats,
                mean_segments,
            });
        }
        reports
    }

    pub fn log_census(&mut self) {
        for report in self.census_report() {
            tracing::info!(
                tick = self.planet.global_tick(),
                region = %report.stats.region,
                population = report.stats.population,
                mean_depth = report.stats.mean_depth,
                mean_segments = report.mean_segments,
                migrations = report.stats.migrations,
                "Census"
            );
        }
        let cache = self.cache.stats();
        tracing::debug!(
            hits = cache.hits,
            misses = cache.misses,
            evictions = cache.evictions,
            "Phenotype cache"
        );
    }

    /// Saves the planet. `.rkyv` paths get the binary format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let snapshot = PlanetSnapshot::capture(&self.planet);
        if is_rkyv(path) {
            save_rkyv(&snapshot, path)?;
        } else {
            save_snapshot(&snapshot, path)?;
        }
        Ok(())
    }
}
