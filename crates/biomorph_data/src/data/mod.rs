pub mod creature;
pub mod event;
pub mod genotype;
pub mod phenotype;
pub mod region;
pub mod stats;
