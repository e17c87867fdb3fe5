use crate::error::{IoError, Result};
use biomorph_core::{Atlas, Planet, PopulationConfig, PopulationState};
use biomorph_data::{Creature, RegionId};
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot layout version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Saved state of one region's population.
#[derive(Debug, Clone, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct RegionSnapshot {
    pub region: RegionId,
    pub creatures: Vec<Creature>,
    pub tick_count: u64,
    pub next_id: u64,
    pub migration_count: u64,
}

impl RegionSnapshot {
    #[must_use]
    pub fn capture(state: &PopulationState) -> Self {
        Self {
            region: state.region().clone(),
            creatures: state.creatures().to_vec(),
            tick_count: state.tick_count(),
            next_id: state.next_id(),
            migration_count: state.migration_count(),
        }
    }

    #[must_use]
    pub fn into_state(self) -> PopulationState {
        PopulationState::restore(
            self.region,
            self.creatures,
            self.tick_count,
            self.next_id,
            self.migration_count,
        )
    }
}

/// Saved state of a whole planet. Region definitions and tuning are not
/// part of it; they come from configuration on restore.
#[derive(Debug, Clone, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct PlanetSnapshot {
    pub format_version: u32,
    pub run_id: Uuid,
    pub global_tick: u64,
    pub total_migrations: u64,
    pub regions: Vec<RegionSnapshot>,
}

impl PlanetSnapshot {
    #[must_use]
    pub fn capture(planet: &Planet) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            run_id: planet.run_id(),
            global_tick: planet.global_tick(),
            total_migrations: planet.total_migrations(),
            regions: planet.states().map(RegionSnapshot::capture).collect(),
        }
    }

    /// Rebuilds a planet. Creatures get their interpolation state reset.
    pub fn restore(self, atlas: Atlas, config: PopulationConfig) -> Result<Planet> {
        if self.format_version > FORMAT_VERSION {
            return Err(IoError::validation(format!(
                "Snapshot format {} is newer than supported format {}",
                self.format_version, FORMAT_VERSION
            )));
        }
        let states = self
            .regions
            .into_iter()
            .map(RegionSnapshot::into_state)
            .collect();
        Planet::from_parts(
            atlas,
            config,
            states,
            self.global_tick,
            self.total_migrations,
            self.run_id,
        )
        .map_err(|e| IoError::validation(e.to_string()))
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.regions.iter().map(|r| r.creatures.len()).sum()
    }

    #[must_use]
    pub fn region(&self, id: &RegionId) -> Option<&RegionSnapshot> {
        self.regions.iter().find(|r| &r.region == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn stepped_planet() -> Planet {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let mut planet =
            Planet::seed_with_rng(Atlas::builtin(), PopulationConfig::default(), &mut rng);
        for _ in 0..300 {
            planet.step_with_rng(&mut rng);
        }
        planet
    }

    #[test]
    fn test_capture_restore_preserves_counters() {
        let planet = stepped_planet();
        let snapshot = PlanetSnapshot::capture(&planet);
        assert_eq!(snapshot.population(), planet.population());
        assert_eq!(snapshot.regions.len(), 5);

        let restored = snapshot
            .restore(Atlas::builtin(), PopulationConfig::default())
            .unwrap();
        assert_eq!(restored.global_tick(), planet.global_tick());
        assert_eq!(restored.total_migrations(), planet.total_migrations());
        assert_eq!(restored.run_id(), planet.run_id());
        for (a, b) in planet.states().zip(restored.states()) {
            assert_eq!(a.region(), b.region());
            assert_eq!(a.tick_count(), b.tick_count());
            assert_eq!(a.next_id(), b.next_id());
            assert_eq!(a.migration_count(), b.migration_count());
            assert_eq!(a.len(), b.len());
        }
    }

    #[test]
    fn test_newer_format_rejected() {
        let mut snapshot = PlanetSnapshot::capture(&stepped_planet());
        snapshot.format_version = FORMAT_VERSION + 1;
        let err = snapshot
            .restore(Atlas::builtin(), PopulationConfig::default())
            .unwrap_err();
        assert!(matches!(err, IoError::Validation(_)));
    }

    #[test]
    fn test_unknown_region_rejected() {
        let mut snapshot = PlanetSnapshot::capture(&stepped_planet());
        snapshot.regions[0].region = RegionId::new("moon");
        assert!(snapshot
            .restore(Atlas::builtin(), PopulationConfig::default())
            .is_err());
    }
}
