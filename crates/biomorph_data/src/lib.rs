//! Core data structures for the Biomorph planet simulation.
//!
//! Everything here is plain data: genotypes and their gene layouts, the
//! line-segment geometry a genotype develops into, creatures, lifecycle
//! events and census records. Behaviour lives in `biomorph_core`.

pub mod data;

pub use data::creature::{Creature, CreatureId, Parents, Position, Velocity};
pub use data::event::{EventKind, LifecycleEvent};
pub use data::genotype::{
    GeneBound, Genotype, Mode, DEPTH_GENE, DIRECTION_GENES, GRADIENT_1_GENE, GRADIENT_2_GENE,
    SEGMENT_COUNT_GENE, SEGMENT_SPACING_GENE,
};
pub use data::phenotype::{Bounds, Phenotype, Point, Segment};
pub use data::region::RegionId;
pub use data::stats::PopulationStats;
