//! The planet driver: owns every region's population and steps them.
//!
//! A global step ticks each region once, in atlas order. Sequential stepping
//! delivers migrants in place, so a migrant into a region later in the order
//! takes part in that region's tick within the same step, while a migrant
//! into an earlier region first moves on the next step.
//!
//! Parallel stepping ticks all regions at once against deferred sinks and
//! delivers the collected departures afterwards, in atlas order.

use crate::config::PopulationConfig;
use crate::metrics::Metrics;
use crate::population::{tick_region, PopulationState};
use crate::region::{Atlas, Region};
use crate::stats::census;
use biomorph_data::{LifecycleEvent, PopulationStats, RegionId};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug)]
pub struct Planet {
    atlas: Atlas,
    states: BTreeMap<RegionId, PopulationState>,
    config: PopulationConfig,
    global_tick: u64,
    total_migrations: u64,
    run_id: Uuid,
    metrics: Arc<Metrics>,
}

impl Planet {
    /// A planet with an empty population in every region.
    #[must_use]
    pub fn new(atlas: Atlas, config: PopulationConfig) -> Self {
        let states = atlas
            .ids()
            .map(|id| (id.clone(), PopulationState::new(id.clone())))
            .collect();
        Self {
            atlas,
            states,
            config,
            global_tick: 0,
            total_migrations: 0,
            run_id: Uuid::new_v4(),
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// Seeds every region with `initial_population` founders.
    pub fn seed_with_rng<R: Rng + ?Sized>(
        atlas: Atlas,
        config: PopulationConfig,
        rng: &mut R,
    ) -> Self {
        let mut planet = Self::new(atlas, config);
        for region in planet.atlas.iter() {
            let state = PopulationState::seed_with_rng(region.id.clone(), &planet.config, rng);
            planet.states.insert(region.id.clone(), state);
        }
        tracing::info!(
            run_id = %planet.run_id,
            regions = planet.atlas.len(),
            population = planet.population(),
            "Planet seeded"
        );
        planet
    }

    pub fn seed(atlas: Atlas, config: PopulationConfig) -> Self {
        let mut rng = rand::thread_rng();
        Self::seed_with_rng(atlas, config, &mut rng)
    }

    /// Rebuilds a planet from saved states.
    ///
    /// Fails when a state names a region the atlas does not know, a region
    /// appears twice, a population exceeds the hard cap, or a creature sits
    /// in a state other than its own region, carries an out-of-bound
    /// genotype or has a serial the state would mint again. Atlas regions
    /// without a saved state start empty.
    pub fn from_parts(
        atlas: Atlas,
        config: PopulationConfig,
        saved: Vec<PopulationState>,
        global_tick: u64,
        total_migrations: u64,
        run_id: Uuid,
    ) -> anyhow::Result<Self> {
        let mut states = BTreeMap::new();
        for state in saved {
            let id = state.region().clone();
            anyhow::ensure!(atlas.contains(&id), "Saved region '{}' is not in the atlas", id);
            anyhow::ensure!(
                state.len() <= config.hard_cap,
                "Region '{}' holds {} creatures, above the hard cap of {}",
                id,
                state.len(),
                config.hard_cap
            );
            for c in state.creatures() {
                anyhow::ensure!(
                    c.region() == &id,
                    "Creature {} belongs to '{}' but is stored in '{}'",
                    c.id(),
                    c.region(),
                    id
                );
                anyhow::ensure!(
                    c.genotype().is_within_bounds(),
                    "Creature {} has an out-of-bound genotype {}",
                    c.id(),
                    c.genotype()
                );
                anyhow::ensure!(
                    c.id().serial < state.next_id(),
                    "Creature {} has a serial at or above next id {}",
                    c.id(),
                    state.next_id()
                );
            }
            anyhow::ensure!(
                states.insert(id.clone(), state).is_none(),
                "Region '{}' saved twice",
                id
            );
        }
        for id in atlas.ids() {
            if !states.contains_key(id) {
                tracing::warn!(region = %id, "No saved state for region, starting empty");
                states.insert(id.clone(), PopulationState::new(id.clone()));
            }
        }
        Ok(Self {
            atlas,
            states,
            config,
            global_tick,
            total_migrations,
            run_id,
            metrics: Arc::new(Metrics::default()),
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// One global step with in-place migration delivery.
    pub fn step_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<LifecycleEvent> {
        let start = Instant::now();
        let mut events = Vec::new();
        for region in self.atlas.iter() {
            events.extend(tick_region(&mut self.states, region, &self.config, rng));
        }
        self.finish_step(&events, start);
        events
    }

    pub fn step(&mut self) -> Vec<LifecycleEvent> {
        let mut rng = rand::thread_rng();
        self.step_with_rng(&mut rng)
    }

    /// One global step with every region ticked in parallel.
    ///
    /// Each region draws its own `ChaCha8Rng` seed from `rng`, so a seeded
    /// master RNG gives a reproducible step regardless of thread scheduling.
    #[cfg(feature = "rayon")]
    pub fn step_parallel_with_rng<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Vec<LifecycleEvent> {
        use crate::population::{DeferredMigrations, PendingMigration};
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;
        use rayon::prelude::*;

        let start = Instant::now();
        let mut work: Vec<(&Region, PopulationState, u64)> = Vec::with_capacity(self.atlas.len());
        for region in self.atlas.iter() {
            let seed = rng.gen::<u64>();
            if let Some(state) = self.states.remove(&region.id) {
                work.push((region, state, seed));
            }
        }

        let config = &self.config;
        let results: Vec<(PopulationState, Vec<LifecycleEvent>, Vec<PendingMigration>)> = work
            .into_par_iter()
            .map(|(region, mut state, seed)| {
                let mut local = ChaCha8Rng::seed_from_u64(seed);
                let mut sink = DeferredMigrations::new();
                let events = state.tick_with_rng(region, &mut sink, config, &mut local);
                (state, events, sink.into_pending())
            })
            .collect();

        let mut events = Vec::new();
        let mut pending = Vec::new();
        for (state, region_events, departures) in results {
            self.states.insert(state.region().clone(), state);
            events.extend(region_events);
            pending.extend(departures);
        }

        self.deliver(pending, rng, &mut events);
        self.finish_step(&events, start);
        events
    }

    #[cfg(feature = "rayon")]
    pub fn step_parallel(&mut self) -> Vec<LifecycleEvent> {
        let mut rng = rand::thread_rng();
        self.step_parallel_with_rng(&mut rng)
    }

    /// Delivers deferred departures in order.
    ///
    /// A destination counts its own undelivered departures as still present,
    /// so a declined migrant can always return to its source without pushing
    /// it over the hard cap.
    #[cfg(feature = "rayon")]
    fn deliver<R: Rng + ?Sized>(
        &mut self,
        pending: Vec<crate::population::PendingMigration>,
        rng: &mut R,
        events: &mut Vec<LifecycleEvent>,
    ) {
        let mut outstanding: BTreeMap<RegionId, usize> = BTreeMap::new();
        for p in &pending {
            *outstanding.entry(p.from.clone()).or_insert(0) += 1;
        }

        for p in pending {
            let arrival = if p.to == p.from {
                None
            } else {
                let reserved = outstanding.get(&p.to).copied().unwrap_or(0);
                match self.states.get_mut(&p.to) {
                    Some(dest) if dest.len() + reserved < self.config.hard_cap => {
                        dest.admit_migrant(&p.creature, &self.config, rng)
                    }
                    _ => None,
                }
            };
            if let Some(count) = outstanding.get_mut(&p.from) {
                *count = count.saturating_sub(1);
            }

            let Some(source) = self.states.get_mut(&p.from) else {
                continue;
            };
            match arrival {
                Some(arrival) => {
                    source.record_emigration();
                    tracing::debug!(from = %p.from, to = %p.to, id = %p.creature.id(), %arrival, "Migration");
                    events.push(LifecycleEvent::Migration {
                        creature: p.creature,
                        from: p.from,
                        to: p.to,
                        arrival,
                    });
                }
                None => {
                    tracing::trace!(from = %p.from, to = %p.to, id = %p.creature.id(), "Migration declined");
                    source.return_migrant(p.creature);
                }
            }
        }
    }

    fn finish_step(&mut self, events: &[LifecycleEvent], start: Instant) {
        let migrations = events.iter().filter(|e| e.is_migration()).count() as u64;
        self.total_migrations += migrations;
        self.global_tick += 1;
        self.metrics
            .record_step(events, self.population(), start.elapsed());
    }

    /// Census of every region, in atlas order.
    #[must_use]
    pub fn census(&self) -> Vec<PopulationStats> {
        self.atlas
            .iter()
            .filter_map(|region| {
                self.states
                    .get(&region.id)
                    .map(|state| census(state, region))
            })
            .collect()
    }

    /// Invariant violations, empty for a consistent planet.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut ids = HashSet::new();
        for (region, state) in &self.states {
            if !self.atlas.contains(region) {
                problems.push(format!("state for unknown region '{region}'"));
            }
            if state.len() > self.config.hard_cap {
                problems.push(format!(
                    "'{}' holds {} creatures (hard cap {})",
                    region,
                    state.len(),
                    self.config.hard_cap
                ));
            }
            for c in state.creatures() {
                if c.region() != region || &c.id().region != region {
                    problems.push(format!("{} is stored in '{}'", c.id(), region));
                }
                if c.id().serial >= state.next_id() {
                    problems.push(format!(
                        "{} has a serial at or above next id {}",
                        c.id(),
                        state.next_id()
                    ));
                }
                if !c.genotype().is_within_bounds() {
                    problems.push(format!("{} has out-of-bound genotype {}", c.id(), c.genotype()));
                }
                if !c.position.in_unit_square() {
                    problems.push(format!("{} is outside the unit square", c.id()));
                }
                if !ids.insert(c.id().clone()) {
                    problems.push(format!("{} appears twice", c.id()));
                }
            }
        }
        problems
    }

    #[must_use]
    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    #[must_use]
    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self, id: &RegionId) -> Option<&PopulationState> {
        self.states.get(id)
    }

    /// Region states in atlas order.
    pub fn states(&self) -> impl Iterator<Item = &PopulationState> {
        self.atlas.ids().filter_map(|id| self.states.get(id))
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.states.values().map(PopulationState::len).sum()
    }

    #[must_use]
    pub fn global_tick(&self) -> u64 {
        self.global_tick
    }

    #[must_use]
    pub fn total_migrations(&self) -> u64 {
        self.total_migrations
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
