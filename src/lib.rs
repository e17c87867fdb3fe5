//! Biomorph planet: the headless application over the core, data and io
//! crates.

pub mod app;

pub use app::{App, RegionReport};
