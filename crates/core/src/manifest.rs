//! Manifest model, wire format, and the local manifest builder
//!
//! A manifest is the record a sync run leaves behind on the remote side:
//! a versioned mapping from remote-relative path to content fingerprint
//! plus file metadata. The next run fetches it back and diffs against a
//! freshly built local manifest instead of listing the remote tree.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ManifestError, ManifestResult, ScanError, ScanResult};
use crate::hash::Fingerprint;
use crate::scan::ScanEntry;

/// Schema version this engine reads and writes
pub const SCHEMA_VERSION: &str = "1";

/// Default manifest file name, published into the remote root
pub const MANIFEST_FILE: &str = ".skiff-manifest.json";

/// Metadata for one synced file, keyed by its remote-relative path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Content fingerprint; the sole input to change detection
    #[serde(rename = "contentFingerprint")]
    pub fingerprint: Fingerprint,

    /// File size in bytes at fingerprint time
    pub size: u64,

    /// Source modification time. Informational only; never used to decide
    /// whether a file changed.
    pub modified_at: DateTime<Utc>,

    /// Local location the file was read from. Only meaningful on the
    /// uploading side; records parsed from a remote manifest may omit it.
    #[serde(rename = "sourceLocation", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

/// Versioned mapping of remote-relative path to [`FileRecord`]
///
/// Paths use forward slashes and are unique. The ordered map keeps
/// serialization deterministic: two manifests with equal content produce
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub files: BTreeMap<String, FileRecord>,
}

impl Manifest {
    /// Create a manifest for the given files, stamped with the current time
    #[must_use]
    pub fn new(files: BTreeMap<String, FileRecord>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            files,
        }
    }

    /// Build a manifest by fingerprinting every scanned file
    ///
    /// Streams each file through the digest and records size and mtime from
    /// filesystem metadata. There is no caching across runs; a file that
    /// vanishes or becomes unreadable mid-build fails the whole build.
    ///
    /// # Errors
    /// Returns an error if any file cannot be read
    pub fn build(entries: &[ScanEntry]) -> ScanResult<Self> {
        let mut files = BTreeMap::new();

        for entry in entries {
            let metadata = std::fs::metadata(&entry.source)
                .map_err(|e| ScanError::io(&entry.source, e))?;
            let fingerprint = Fingerprint::from_file(&entry.source)
                .map_err(|e| ScanError::io(&entry.source, e))?;
            let modified = metadata
                .modified()
                .map_err(|e| ScanError::io(&entry.source, e))?;

            files.insert(
                entry.path.clone(),
                FileRecord {
                    fingerprint,
                    size: metadata.len(),
                    modified_at: modified.into(),
                    source: Some(entry.source.clone()),
                },
            );
        }

        debug!(files = files.len(), "local manifest built");
        Ok(Self::new(files))
    }

    /// Number of files in the manifest
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the manifest records no files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Serialize to the wire format (pretty JSON, trailing newline)
    ///
    /// # Errors
    /// Returns an error if the manifest cannot be encoded
    pub fn to_bytes(&self) -> ManifestResult<Vec<u8>> {
        let mut bytes =
            serde_json::to_vec_pretty(self).map_err(|e| ManifestError::Format(e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse a manifest from its wire format
    ///
    /// The schema version is probed from a minimal header before the full
    /// parse, so a well-formed manifest written by a newer schema reports
    /// [`ManifestError::Version`] rather than a shape error. Unknown fields
    /// are ignored.
    ///
    /// # Errors
    /// Returns [`ManifestError::Format`] for malformed documents or missing
    /// required fields, [`ManifestError::Version`] for unknown schema
    /// versions
    pub fn from_bytes(bytes: &[u8]) -> ManifestResult<Self> {
        #[derive(Deserialize)]
        struct Header {
            #[serde(rename = "schemaVersion")]
            schema_version: String,
        }

        let header: Header =
            serde_json::from_slice(bytes).map_err(|e| ManifestError::Format(e.to_string()))?;
        if header.schema_version != SCHEMA_VERSION {
            return Err(ManifestError::Version(header.schema_version));
        }

        serde_json::from_slice(bytes).map_err(|e| ManifestError::Format(e.to_string()))
    }
}
