//! Per-region population state and the tick engine.
//!
//! One tick runs four phases over a region's population, in order:
//! movement, breeding, death and migration, then commits the result.
//! Newborns are held apart until the commit, so they never die or migrate
//! in the tick that produced them. Migration hands the departing creature to
//! a [`MigrationSink`], which either re-mints it in the destination at once
//! or defers delivery to the driver.

use crate::config::PopulationConfig;
use crate::region::Region;
use crate::variation::{mutate_with_rng, random_interesting_with_rng, GenotypeLogic};
use biomorph_data::{
    Creature, CreatureId, Genotype, LifecycleEvent, Parents, Position, RegionId, Velocity,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serial handed to the first creature of a fresh region.
pub const FIRST_SERIAL: u64 = 1;

/// Outcome of offering a migrant to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The destination admitted the migrant under a new identity.
    Arrived(CreatureId),
    /// Unknown or full destination. The creature stays where it is.
    Declined,
    /// Accepted for later delivery. The creature leaves its source now.
    Deferred,
}

/// Receiver of migrants leaving a region during its tick.
pub trait MigrationSink {
    fn offer<R: Rng + ?Sized>(
        &mut self,
        to: &RegionId,
        migrant: &Creature,
        config: &PopulationConfig,
        rng: &mut R,
    ) -> Delivery;
}

/// In-place delivery into sibling states. The ticking state is removed from
/// the map for the duration of its tick, so a self-targeted migrant is
/// declined like an unknown one.
impl MigrationSink for BTreeMap<RegionId, PopulationState> {
    fn offer<R: Rng + ?Sized>(
        &mut self,
        to: &RegionId,
        migrant: &Creature,
        config: &PopulationConfig,
        rng: &mut R,
    ) -> Delivery {
        match self.get_mut(to) {
            Some(state) => match state.admit_migrant(migrant, config, rng) {
                Some(id) => Delivery::Arrived(id),
                None => Delivery::Declined,
            },
            None => Delivery::Declined,
        }
    }
}

/// A departure waiting for delivery.
#[derive(Debug, Clone)]
pub struct PendingMigration {
    pub from: RegionId,
    pub to: RegionId,
    pub creature: Creature,
}

/// Collects departures for two-phase stepping: every region ticks against
/// its own collector, and the driver delivers afterwards.
#[derive(Debug, Default)]
pub struct DeferredMigrations {
    pending: Vec<PendingMigration>,
}

impl DeferredMigrations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn into_pending(self) -> Vec<PendingMigration> {
        self.pending
    }
}

impl MigrationSink for DeferredMigrations {
    fn offer<R: Rng + ?Sized>(
        &mut self,
        to: &RegionId,
        migrant: &Creature,
        _config: &PopulationConfig,
        _rng: &mut R,
    ) -> Delivery {
        self.pending.push(PendingMigration {
            from: migrant.region().clone(),
            to: to.clone(),
            creature: migrant.clone(),
        });
        Delivery::Deferred
    }
}

/// Live creatures of one region plus its counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationState {
    region: RegionId,
    creatures: Vec<Creature>,
    tick_count: u64,
    next_id: u64,
    migration_count: u64,
}

impl PopulationState {
    /// An empty population.
    #[must_use]
    pub fn new(region: RegionId) -> Self {
        Self {
            region,
            creatures: Vec::new(),
            tick_count: 0,
            next_id: FIRST_SERIAL,
            migration_count: 0,
        }
    }

    /// A fresh population of `initial_population` founders.
    pub fn seed_with_rng<R: Rng + ?Sized>(
        region: RegionId,
        config: &PopulationConfig,
        rng: &mut R,
    ) -> Self {
        let mut state = Self::new(region);
        for _ in 0..config.initial_population {
            let genotype = random_interesting_with_rng(config.mode, rng);
            let position = Position::new(
                config.seed_min + rng.gen::<f64>() * config.seed_span,
                config.seed_min + rng.gen::<f64>() * config.seed_span,
            );
            let velocity = jitter_velocity(config, rng);
            let id = state.mint_id();
            state
                .creatures
                .push(Creature::new(id, genotype, position, velocity, 0, None));
        }
        tracing::debug!(region = %state.region, population = state.len(), "Seeded region");
        state
    }

    /// Rebuilds a state from saved parts. Interpolation state is reset.
    #[must_use]
    pub fn restore(
        region: RegionId,
        mut creatures: Vec<Creature>,
        tick_count: u64,
        next_id: u64,
        migration_count: u64,
    ) -> Self {
        for creature in &mut creatures {
            creature.reset_interpolation();
        }
        Self {
            region,
            creatures,
            tick_count,
            next_id,
            migration_count,
        }
    }

    #[must_use]
    pub fn region(&self) -> &RegionId {
        &self.region
    }

    #[must_use]
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Serial the next minted creature will receive.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    #[must_use]
    pub fn migration_count(&self) -> u64 {
        self.migration_count
    }

    #[must_use]
    pub fn get(&self, id: &CreatureId) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id() == id)
    }

    fn mint_id(&mut self) -> CreatureId {
        let id = CreatureId::new(self.region.clone(), self.next_id);
        self.next_id += 1;
        id
    }

    /// Re-mints `migrant` here near the centre of the region. Returns the new
    /// identity, or `None` when the population is at the hard cap.
    pub fn admit_migrant<R: Rng + ?Sized>(
        &mut self,
        migrant: &Creature,
        config: &PopulationConfig,
        rng: &mut R,
    ) -> Option<CreatureId> {
        if self.creatures.len() >= config.hard_cap {
            return None;
        }
        let position = Position::new(
            config.arrival_min + rng.gen::<f64>() * config.arrival_span,
            config.arrival_min + rng.gen::<f64>() * config.arrival_span,
        );
        let velocity = jitter_velocity(config, rng);
        let id = self.mint_id();
        self.creatures
            .push(migrant.relocated(id.clone(), position, velocity));
        Some(id)
    }

    /// Puts back a departed creature whose delivery was declined.
    pub(crate) fn return_migrant(&mut self, creature: Creature) {
        self.creatures.push(creature);
    }

    /// Credits a deferred departure once it has been delivered.
    pub(crate) fn record_emigration(&mut self) {
        self.migration_count += 1;
    }

    /// Advances this population by one tick.
    ///
    /// `region` supplies the fitness rule and adjacency; `sink` receives
    /// migrants. Returns the tick's lifecycle events: births, then deaths,
    /// then migrations.
    pub fn tick_with_rng<S, R>(
        &mut self,
        region: &Region,
        sink: &mut S,
        config: &PopulationConfig,
        rng: &mut R,
    ) -> Vec<LifecycleEvent>
    where
        S: MigrationSink + ?Sized,
        R: Rng + ?Sized,
    {
        let mut events = Vec::new();

        self.move_creatures(config, rng);
        let newborns = self.breed(config, rng, &mut events);
        let dead = self.mark_deaths(region, config, rng, &mut events);
        let departed = self.migrate(region, &dead, sink, config, rng, &mut events);

        let creatures = std::mem::take(&mut self.creatures);
        self.creatures = creatures
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !dead[*i] && !departed[*i])
            .map(|(_, c)| c)
            .chain(newborns)
            .collect();
        self.tick_count += 1;

        events
    }

    fn move_creatures<R: Rng + ?Sized>(&mut self, config: &PopulationConfig, rng: &mut R) {
        for c in &mut self.creatures {
            c.previous_position = c.position;
            c.velocity.vx += (rng.gen::<f64>() - 0.5) * config.velocity_jitter;
            c.velocity.vy += (rng.gen::<f64>() - 0.5) * config.velocity_jitter;
            c.velocity.vx *= config.damping;
            c.velocity.vy *= config.damping;
            c.position.x += c.velocity.vx;
            c.position.y += c.velocity.vy;
            bounce(&mut c.position.x, &mut c.velocity.vx, config);
            bounce(&mut c.position.y, &mut c.velocity.vy, config);
            c.age += 1;
        }
    }

    fn breed<R: Rng + ?Sized>(
        &mut self,
        config: &PopulationConfig,
        rng: &mut R,
        events: &mut Vec<LifecycleEvent>,
    ) -> Vec<Creature> {
        let mut newborns = Vec::new();
        if self.creatures.len() >= config.hard_cap {
            return newborns;
        }

        for i in 0..self.creatures.len() {
            if rng.gen::<f64>() >= config.breed_chance {
                continue;
            }
            let Some(j) = self.nearest_mate(i, config.breed_radius) else {
                continue;
            };

            let (a, b) = (&self.creatures[i], &self.creatures[j]);
            let crossed = a.genotype().crossover_with_rng(b.genotype(), rng).genotype;
            let genotype = mutate_with_rng(&mutate_with_rng(&crossed, rng), rng);
            let midpoint = a.position.midpoint(&b.position);
            let position = Position::new(
                (midpoint.x + (rng.gen::<f64>() - 0.5) * config.offspring_jitter).clamp(0.0, 1.0),
                (midpoint.y + (rng.gen::<f64>() - 0.5) * config.offspring_jitter).clamp(0.0, 1.0),
            );
            let generation = a.generation().max(b.generation()) + 1;
            let parents = Parents(a.id().clone(), b.id().clone());
            let velocity = jitter_velocity(config, rng);

            let child = Creature::new(
                self.mint_id(),
                genotype,
                position,
                velocity,
                generation,
                Some(parents),
            );
            tracing::trace!(region = %self.region, id = %child.id(), generation, "Birth");
            events.push(LifecycleEvent::Birth {
                region: self.region.clone(),
                creature: child.clone(),
            });
            newborns.push(child);

            if self.creatures.len() + newborns.len() >= config.hard_cap {
                break;
            }
        }
        newborns
    }

    /// Index of the closest other creature strictly within `radius`.
    fn nearest_mate(&self, i: usize, radius: f64) -> Option<usize> {
        let me = &self.creatures[i].position;
        let mut best = None;
        let mut best_distance = radius;
        for (j, other) in self.creatures.iter().enumerate() {
            if j == i {
                continue;
            }
            let d = me.distance(&other.position);
            if d < best_distance {
                best_distance = d;
                best = Some(j);
            }
        }
        best
    }

    fn mark_deaths<R: Rng + ?Sized>(
        &self,
        region: &Region,
        config: &PopulationConfig,
        rng: &mut R,
        events: &mut Vec<LifecycleEvent>,
    ) -> Vec<bool> {
        let density = config.density_factor(self.creatures.len());
        self.creatures
            .iter()
            .map(|c| {
                let p = config.death_base_rate
                    * config.age_factor(c.age)
                    * density
                    * region.fitness_modifier(c.genotype());
                let dies = rng.gen::<f64>() < p;
                if dies {
                    tracing::trace!(region = %self.region, id = %c.id(), age = c.age, "Death");
                    events.push(LifecycleEvent::Death {
                        region: self.region.clone(),
                        creature: c.clone(),
                    });
                }
                dies
            })
            .collect()
    }

    fn migrate<S, R>(
        &mut self,
        region: &Region,
        dead: &[bool],
        sink: &mut S,
        config: &PopulationConfig,
        rng: &mut R,
        events: &mut Vec<LifecycleEvent>,
    ) -> Vec<bool>
    where
        S: MigrationSink + ?Sized,
        R: Rng + ?Sized,
    {
        let mut departed = vec![false; self.creatures.len()];
        if region.adjacent.is_empty() {
            return departed;
        }

        for (i, c) in self.creatures.iter().enumerate() {
            if dead[i] || !near_edge(&c.position, config.migration_edge) {
                continue;
            }
            if rng.gen::<f64>() >= config.migration_chance {
                continue;
            }
            let to = &region.adjacent[rng.gen_range(0..region.adjacent.len())];
            match sink.offer(to, c, config, rng) {
                Delivery::Arrived(arrival) => {
                    departed[i] = true;
                    self.migration_count += 1;
                    tracing::debug!(from = %self.region, %to, id = %c.id(), %arrival, "Migration");
                    events.push(LifecycleEvent::Migration {
                        creature: c.clone(),
                        from: self.region.clone(),
                        to: to.clone(),
                        arrival,
                    });
                }
                Delivery::Deferred => departed[i] = true,
                Delivery::Declined => {}
            }
        }
        departed
    }
}

/// Ticks `region`'s state in place, delivering migrants straight into the
/// other states of `states`. A region with no state produces no events.
pub fn tick_region<R: Rng + ?Sized>(
    states: &mut BTreeMap<RegionId, PopulationState>,
    region: &Region,
    config: &PopulationConfig,
    rng: &mut R,
) -> Vec<LifecycleEvent> {
    let Some(mut state) = states.remove(&region.id) else {
        return Vec::new();
    };
    let events = state.tick_with_rng(region, states, config, rng);
    states.insert(region.id.clone(), state);
    events
}

fn jitter_velocity<R: Rng + ?Sized>(config: &PopulationConfig, rng: &mut R) -> Velocity {
    Velocity {
        vx: (rng.gen::<f64>() - 0.5) * config.velocity_jitter,
        vy: (rng.gen::<f64>() - 0.5) * config.velocity_jitter,
    }
}

fn bounce(coord: &mut f64, velocity: &mut f64, config: &PopulationConfig) {
    if *coord < config.bounce_min {
        *coord = config.bounce_min;
        *velocity = velocity.abs() * config.bounce_restitution;
    }
    if *coord > config.bounce_max {
        *coord = config.bounce_max;
        *velocity = -velocity.abs() * config.bounce_restitution;
    }
}

fn near_edge(p: &Position, edge: f64) -> bool {
    p.x < edge || p.x > 1.0 - edge || p.y < edge || p.y > 1.0 - edge
}

/// Creates a founder-like creature with an explicit genotype. Used by tests
/// and tools that build populations by hand.
pub fn spawn(
    state: &mut PopulationState,
    genotype: Genotype,
    position: Position,
    age: u64,
) -> CreatureId {
    let id = state.mint_id();
    let mut creature = Creature::new(id.clone(), genotype, position, Velocity::default(), 0, None);
    creature.age = age;
    state.creatures.push(creature);
    id
}
