//! Serialization helpers for JSON and HexDNA.
//!
//! HexDNA is the portable text form of a genotype: one byte for the mode
//! followed by one two's-complement byte per gene, Base16 encoded, so
//! `m1[-1,3,-1,-1,2,2,2,3,5]` becomes `01ff03ffff0202020305`.

use crate::error::{IoError, Result};
use biomorph_data::{Genotype, Mode};
use serde::{Deserialize, Serialize};

/// Serializes data to JSON.
pub fn to_json<T>(data: &T) -> Result<String>
where
    T: Serialize,
{
    serde_json::to_string(data)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))
}

pub fn to_json_pretty<T>(data: &T) -> Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(data)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))
}

/// Deserializes data from a JSON string, rejecting blank input.
pub fn from_json<T>(json: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    if json.trim().is_empty() {
        return Err(IoError::validation("Empty JSON string"));
    }

    serde_json::from_str(json)
        .map_err(|e| IoError::serialization(format!("JSON deserialization failed: {}", e)))
}

/// Encodes a genotype as HexDNA.
#[must_use]
pub fn to_hex_dna(genotype: &Genotype) -> String {
    let mut bytes = Vec::with_capacity(genotype.len() + 1);
    bytes.push(genotype.mode().number());
    bytes.extend(genotype.genes().iter().map(|g| *g as i8 as u8));
    hex::encode(bytes)
}

/// Decodes HexDNA, checking the mode, gene count and gene bounds.
pub fn from_hex_dna(hex_str: &str) -> Result<Genotype> {
    let hex_str = hex_str.trim();
    if hex_str.is_empty() {
        return Err(IoError::validation("Empty hex string"));
    }

    let bytes = hex::decode(hex_str)
        .map_err(|e| IoError::validation(format!("Invalid hex encoding: {}", e)))?;
    let Some((&mode_byte, genes)) = bytes.split_first() else {
        return Err(IoError::validation("Decoded hex is empty"));
    };

    let mode = Mode::try_from(mode_byte).map_err(IoError::validation)?;
    let genes = genes.iter().map(|b| i32::from(*b as i8)).collect();
    Genotype::new(mode, genes).map_err(|e| IoError::validation(e.to_string()))
}

/// Whether `hex_str` decodes to a valid genotype.
#[must_use]
pub fn is_valid_hex_dna(hex_str: &str) -> bool {
    from_hex_dna(hex_str).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Genotype {
        Genotype::new(Mode::Basic, vec![-1, 3, -1, -1, 2, 2, 2, 3, 5]).unwrap()
    }

    #[test]
    fn test_hex_dna_encoding() {
        assert_eq!(to_hex_dna(&reference()), "01ff03ffff0202020305");
    }

    #[test]
    fn test_hex_dna_roundtrip_all_modes() {
        for mode in Mode::ALL {
            let g = Genotype::clamped(mode, &[-3, 3, -2, 2, -1, 1, 0, -3, 8, 8, 12, -3, 3]);
            assert_eq!(from_hex_dna(&to_hex_dna(&g)).unwrap(), g);
        }
    }

    #[test]
    fn test_hex_dna_rejects_bad_input() {
        assert!(from_hex_dna("").is_err());
        assert!(from_hex_dna("not_valid_hex!").is_err());
        // Unknown mode 9.
        assert!(from_hex_dna("09ff03ffff0202020305").is_err());
        // Gene count short by one.
        assert!(from_hex_dna("01ff03ffff02020203").is_err());
        // Depth 9 is out of bound.
        assert!(from_hex_dna("01ff03ffff0202020309").is_err());
    }

    #[test]
    fn test_is_valid_hex_dna() {
        assert!(is_valid_hex_dna("01ff03ffff0202020305"));
        assert!(is_valid_hex_dna(" 01ff03ffff0202020305\n"));
        assert!(!is_valid_hex_dna("7b7d"));
    }

    #[test]
    fn test_json_roundtrip() {
        let json = to_json(&reference()).unwrap();
        let back: Genotype = from_json(&json).unwrap();
        assert_eq!(back, reference());
        assert!(from_json::<Genotype>("   ").is_err());
        assert!(from_json::<Genotype>("{ invalid json").is_err());
    }
}
