//! Save files.
//!
//! The primary format is gzip-compressed JSON: an envelope carrying the
//! snapshot JSON as a string plus its SHA-256 digest, so a load can tell a
//! damaged or hand-edited file from a valid one. rkyv files are a compact
//! binary alternative validated with `check_archived_root`.

use crate::error::{IoError, Result};
use crate::serialization::{from_json, to_json};
use crate::snapshot::PlanetSnapshot;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(SerdeSerialize, SerdeDeserialize)]
struct SaveEnvelope {
    saved_at: DateTime<Utc>,
    checksum: String,
    payload: String,
}

fn checksum(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// Writes `snapshot` as checksummed gzip JSON.
pub fn save_snapshot<P: AsRef<Path>>(snapshot: &PlanetSnapshot, path: P) -> Result<()> {
    let path = path.as_ref();
    let payload = to_json(snapshot)?;
    let envelope = SaveEnvelope {
        saved_at: Utc::now(),
        checksum: checksum(&payload),
        payload,
    };
    let json = to_json(&envelope)?;

    let file = File::create(path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("creating save file {}", path.display()))
    })?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(json.as_bytes())?;
    encoder
        .finish()
        .map_err(|e| IoError::compression(e.to_string()))?;

    tracing::info!(
        path = %path.display(),
        tick = snapshot.global_tick,
        population = snapshot.population(),
        "Saved planet"
    );
    Ok(())
}

/// Reads a checksummed gzip JSON save.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<PlanetSnapshot> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::not_found(path.display().to_string()));
    }

    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut json = String::new();
    decoder
        .read_to_string(&mut json)
        .map_err(|e| IoError::compression(e.to_string()).with_context(path.display().to_string()))?;

    let envelope: SaveEnvelope = from_json(&json)?;
    let actual = checksum(&envelope.payload);
    if actual != envelope.checksum {
        tracing::warn!(path = %path.display(), "Save file checksum mismatch");
        return Err(IoError::validation(format!(
            "checksum mismatch: expected {}, got {}",
            envelope.checksum, actual
        )));
    }

    let snapshot: PlanetSnapshot = from_json(&envelope.payload)?;
    tracing::info!(
        path = %path.display(),
        saved_at = %envelope.saved_at,
        tick = snapshot.global_tick,
        "Loaded planet"
    );
    Ok(snapshot)
}

pub fn save_rkyv<T, P>(data: &T, path: P) -> Result<()>
where
    T: Serialize<AllocSerializer<4096>>,
    T: Archive,
    P: AsRef<Path>,
{
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(data)
        .map_err(|e| IoError::rkyv(format!("serialization failed: {:?}", e)))?;
    let bytes = serializer.into_serializer().into_inner();
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

pub fn load_rkyv<T, P>(path: P) -> Result<T>
where
    T: Archive,
    T::Archived: Deserialize<T, SharedDeserializeMap>
        + for<'a> rkyv::CheckBytes<rkyv::validation::validators::DefaultValidator<'a>>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::not_found(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let archived = rkyv::check_archived_root::<T>(&bytes)
        .map_err(|e| IoError::rkyv(format!("validation failed: {:?}", e)))?;
    let mut deserializer = SharedDeserializeMap::default();
    let deserialized: T = archived
        .deserialize(&mut deserializer)
        .map_err(|e| IoError::rkyv(format!("deserialization failed: {:?}", e)))?;
    Ok(deserialized)
}
