//! skiff-core: manifest-driven sync primitives
//!
//! Provides content fingerprinting, tree walking, the manifest model and
//! wire format, and the diff engine that turns two manifests into a sync
//! plan.

pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod plan;
pub mod scan;

pub use config::{CONFIG_FILE, Protocol, SyncConfig};
pub use error::{ConfigError, ManifestError, ScanError};
pub use hash::Fingerprint;
pub use manifest::{FileRecord, MANIFEST_FILE, Manifest, SCHEMA_VERSION};
pub use plan::{PlanCounts, SyncPlan, UploadItem, UploadKind, compare};
pub use scan::{DEFAULT_EXCLUDES, ScanEntry, Walker};
