//! Error types for configuration, scanning, and manifest handling

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading or validating configuration.
///
/// All of these are fatal and reported before any remote I/O happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Errors produced while walking and fingerprinting the local tree.
///
/// A file that disappears or becomes unreadable mid-scan aborts the run;
/// no manifest built from a partial scan is ever published.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid exclude pattern")]
    Pattern(#[source] ignore::Error),

    #[error("directory walk failed")]
    Walk(#[from] ignore::Error),

    #[error("local path {} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors produced while encoding or decoding a manifest document.
///
/// Callers retrieving a remote manifest treat both variants as "no usable
/// manifest" and fall back to a full sync.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The document is malformed or missing a required field.
    #[error("manifest format invalid: {0}")]
    Format(String),

    /// The document is well formed but written by an unknown schema version.
    #[error("unsupported manifest schema version {0:?}")]
    Version(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ScanResult<T> = Result<T, ScanError>;
pub type ManifestResult<T> = Result<T, ManifestError>;
