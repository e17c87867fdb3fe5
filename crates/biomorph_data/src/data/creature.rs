use super::genotype::{Genotype, Mode};
use super::region::RegionId;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Creature identity: the owning region plus a per-region serial number.
///
/// Serials come from a monotonically increasing counter in the region's
/// population state and are never reused. A migrating creature receives a new
/// identity minted by its destination.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
#[archive_attr(derive(Debug, PartialEq, Eq, Hash))]
pub struct CreatureId {
    pub region: RegionId,
    pub serial: u64,
}

impl CreatureId {
    #[must_use]
    pub fn new(region: RegionId, serial: u64) -> Self {
        Self { region, serial }
    }
}

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.region, self.serial)
    }
}

/// Region-local position in the unit square.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    #[must_use]
    pub fn midpoint(&self, other: &Position) -> Position {
        Position::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

/// Identifiers of the two creatures a newborn was bred from.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Parents(pub CreatureId, pub CreatureId);

impl Parents {
    #[must_use]
    pub fn contains(&self, id: &CreatureId) -> bool {
        &self.0 == id || &self.1 == id
    }
}

/// A living biomorph inside one region's population.
///
/// Identity, genotype and lineage are fixed at creation; only the kinematic
/// state and age change as the simulation ticks.
#[derive(Clone, Debug, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct Creature {
    id: CreatureId,
    genotype: Genotype,
    pub position: Position,
    pub velocity: Velocity,
    /// Position before the last movement phase (render interpolation only).
    #[serde(skip)]
    #[with(rkyv::with::Skip)]
    pub previous_position: Position,
    pub age: u64,
    generation: u32,
    parents: Option<Parents>,
    region: RegionId,
}

impl Creature {
    /// A newborn or founder: age zero, owned by the region its id names.
    #[must_use]
    pub fn new(
        id: CreatureId,
        genotype: Genotype,
        position: Position,
        velocity: Velocity,
        generation: u32,
        parents: Option<Parents>,
    ) -> Self {
        let region = id.region.clone();
        Self {
            id,
            genotype,
            position,
            velocity,
            previous_position: position,
            age: 0,
            generation,
            parents,
            region,
        }
    }

    /// Copy of this creature under a new identity in another region.
    ///
    /// Genotype, age, generation and parents carry over; identity, region and
    /// kinematics come from the destination.
    #[must_use]
    pub fn relocated(&self, id: CreatureId, position: Position, velocity: Velocity) -> Self {
        let mut moved = Self::new(
            id,
            self.genotype.clone(),
            position,
            velocity,
            self.generation,
            self.parents.clone(),
        );
        moved.age = self.age;
        moved
    }

    #[must_use]
    pub fn id(&self) -> &CreatureId {
        &self.id
    }

    #[must_use]
    pub fn genotype(&self) -> &Genotype {
        &self.genotype
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.genotype.mode()
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn parents(&self) -> Option<&Parents> {
        self.parents.as_ref()
    }

    #[must_use]
    pub fn is_founder(&self) -> bool {
        self.parents.is_none()
    }

    #[must_use]
    pub fn region(&self) -> &RegionId {
        &self.region
    }

    /// Resets interpolation state after a restore.
    pub fn reset_interpolation(&mut self) {
        self.previous_position = self.position;
    }
}
