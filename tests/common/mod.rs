use biomorph_core::population::spawn;
use biomorph_core::{Atlas, FitnessRule, Planet, PopulationConfig, PopulationState, Region};
use biomorph_data::{Genotype, Mode, Position, RegionId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

struct PlacedCreature {
    region: RegionId,
    genotype: Genotype,
    position: Position,
    age: u64,
}

/// Builds planets for tests. Regions start empty unless `seeded` is called.
#[allow(dead_code)]
pub struct PlanetBuilder {
    atlas: Atlas,
    config: PopulationConfig,
    seed: u64,
    seeded: bool,
    creatures: Vec<PlacedCreature>,
}

#[allow(dead_code)]
impl PlanetBuilder {
    pub fn new() -> Self {
        Self {
            atlas: Atlas::builtin(),
            config: PopulationConfig::default(),
            seed: 0,
            seeded: false,
            creatures: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_atlas(mut self, atlas: Atlas) -> Self {
        self.atlas = atlas;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut PopulationConfig),
    {
        modifier(&mut self.config);
        self
    }

    /// Fills every region with random founders before placed creatures.
    pub fn seeded(mut self) -> Self {
        self.seeded = true;
        self
    }

    pub fn with_creature(
        mut self,
        region: &str,
        genotype: Genotype,
        x: f64,
        y: f64,
        age: u64,
    ) -> Self {
        self.creatures.push(PlacedCreature {
            region: RegionId::from(region),
            genotype,
            position: Position::new(x, y),
            age,
        });
        self
    }

    pub fn build(self) -> (Planet, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut states: Vec<PopulationState> = self
            .atlas
            .ids()
            .map(|id| {
                if self.seeded {
                    PopulationState::seed_with_rng(id.clone(), &self.config, &mut rng)
                } else {
                    PopulationState::new(id.clone())
                }
            })
            .collect();
        for placed in self.creatures {
            let state = states
                .iter_mut()
                .find(|s| s.region() == &placed.region)
                .expect("creature placed in unknown region");
            spawn(state, placed.genotype, placed.position, placed.age);
        }
        let planet = Planet::from_parts(self.atlas, self.config, states, 0, 0, Uuid::new_v4())
            .expect("Failed to build planet in test builder");
        (planet, rng)
    }
}

/// Two neutral regions `a` and `b`, each adjacent to the other.
#[allow(dead_code)]
pub fn two_region_atlas() -> Atlas {
    let region = |id: &str, other: &str| Region {
        id: RegionId::from(id),
        name: id.to_uppercase(),
        description: String::new(),
        selection_label: String::new(),
        adjacent: vec![RegionId::from(other)],
        rule: FitnessRule::Neutral,
    };
    Atlas::new(vec![region("a", "b"), region("b", "a")]).expect("valid two-region atlas")
}

/// A single isolated region with the given rule.
#[allow(dead_code)]
pub fn single_region_atlas(id: &str, rule: FitnessRule) -> Atlas {
    Atlas::new(vec![Region {
        id: RegionId::from(id),
        name: id.to_string(),
        description: String::new(),
        selection_label: String::new(),
        adjacent: Vec::new(),
        rule,
    }])
    .expect("valid single-region atlas")
}

/// A basic-mode genotype with the given depth and every direction gene set
/// to `spread`.
#[allow(dead_code)]
pub fn genotype_with_depth(depth: i32, spread: i32) -> Genotype {
    let mut genes = vec![spread; 8];
    genes.push(depth);
    Genotype::new(Mode::Basic, genes).expect("genotype within bounds")
}
