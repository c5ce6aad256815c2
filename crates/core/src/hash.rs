//! Content fingerprints using BLAKE3

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A content fingerprint using BLAKE3 (256-bit)
///
/// Change detection compares fingerprints and nothing else; two files with
/// equal fingerprints are the same file as far as syncing is concerned.
/// Serializes as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint arbitrary bytes
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Fingerprint a file by path, streaming its contents
    ///
    /// # Errors
    /// Returns an error if the file cannot be read
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let mut file = std::fs::File::open(path)?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0u8; 64 * 1024]; // 64KB buffer

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Parse a fingerprint from its hex form
    ///
    /// # Errors
    /// Returns an error if the input is not 64 hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self, ParseFingerprintError> {
        let bytes = hex::decode(hex_str)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ParseFingerprintError::Length(b.len()))?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Error returned when a hex fingerprint cannot be parsed
#[derive(Debug, Error)]
pub enum ParseFingerprintError {
    #[error("fingerprint is not valid hex")]
    Hex(#[from] hex::FromHexError),

    #[error("fingerprint has {0} bytes, expected 32")]
    Length(usize),
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(D::Error::custom)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Fingerprint({})", hex.get(..16).unwrap_or(&hex))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "{}", hex.get(..16).unwrap_or(&hex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let data = b"hello world";
        let f1 = Fingerprint::from_bytes(data);
        let f2 = Fingerprint::from_bytes(data);
        assert_eq!(f1, f2);
    }

    #[test]
    fn test_fingerprint_different_data() {
        let f1 = Fingerprint::from_bytes(b"hello");
        let f2 = Fingerprint::from_bytes(b"world");
        assert_ne!(f1, f2);
    }

    #[test]
    fn test_hex_round_trip() {
        let f = Fingerprint::from_bytes(b"round trip");
        let parsed = Fingerprint::from_hex(&f.to_hex()).unwrap();
        assert_eq!(f, parsed);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Fingerprint::from_hex("not hex").is_err());
        assert!(Fingerprint::from_hex("abcd").is_err());
    }

    #[test]
    fn test_from_file_matches_from_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"file contents").unwrap();

        let from_file = Fingerprint::from_file(&path).unwrap();
        let from_bytes = Fingerprint::from_bytes(b"file contents");
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let f = Fingerprint::from_bytes(b"wire form");
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, format!("\"{}\"", f.to_hex()));

        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
