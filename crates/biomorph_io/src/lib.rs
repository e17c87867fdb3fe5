//! # Biomorph IO
//!
//! Persistence layer for the biomorph planet.
//!
//! This crate provides:
//! - Structured error handling with a crate-wide error type
//! - JSON and HexDNA serialization helpers
//! - Planet snapshots with checksummed gzip and rkyv save files
//! - An append-only lifecycle history log

/// Error types and result aliases for I/O operations
pub mod error;
/// Append-only JSONL log of lifecycle events
pub mod history;
/// Save and load of planet snapshots
pub mod persistence;
/// Validated serialization helpers for JSON and HexDNA formats
pub mod serialization;
/// Serializable planet and region state
pub mod snapshot;

pub use error::{IoError, Result};
pub use history::{read_history, HistoryLogger, HistoryRecord};
pub use persistence::{load_rkyv, load_snapshot, save_rkyv, save_snapshot};
pub use serialization::{from_hex_dna, from_json, is_valid_hex_dna, to_hex_dna, to_json, to_json_pretty};
pub use snapshot::{PlanetSnapshot, RegionSnapshot, FORMAT_VERSION};
