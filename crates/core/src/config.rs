//! Sync configuration parsing (skiff.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::manifest::MANIFEST_FILE;

/// Default config file name
pub const CONFIG_FILE: &str = "skiff.toml";

/// Transport selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// System ssh/scp to a remote host
    Ssh,
    /// Mirror into a local directory (mounted folders, tests)
    Local,
}

impl Protocol {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Local => "local",
        }
    }
}

/// Configuration for one sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub protocol: Protocol,

    /// Remote host (required for ssh)
    pub host: Option<String>,

    /// SSH port
    pub port: u16,

    /// Remote user (required for ssh)
    pub user: Option<String>,

    /// Identity file passed to ssh/scp
    pub key_path: Option<PathBuf>,

    /// Local tree to sync from
    pub local_root: PathBuf,

    /// Remote tree to sync into. For the local protocol this is a plain
    /// directory path.
    pub remote_root: String,

    /// Exclude patterns (gitignore syntax), merged after the built-in
    /// defaults
    pub exclude: Vec<String>,

    /// Plan and report without touching the remote
    pub dry_run: bool,

    /// Delete remote files that no longer exist locally
    pub delete_orphaned: bool,

    /// Name of the manifest document published into the remote root
    pub manifest_file_name: String,

    /// Ignore any remote manifest and upload everything
    pub force_full_sync: bool,

    /// Concurrent upload limit
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Ssh,
            host: None,
            port: 22,
            user: None,
            key_path: None,
            local_root: PathBuf::from("."),
            remote_root: String::new(),
            exclude: Vec::new(),
            dry_run: false,
            delete_orphaned: false,
            manifest_file_name: MANIFEST_FILE.to_string(),
            force_full_sync: false,
            workers: 4,
        }
    }
}

impl SyncConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check the configuration before any remote I/O
    ///
    /// # Errors
    /// Returns an error naming the first missing or invalid setting
    pub fn validate(&self) -> ConfigResult<()> {
        if self.remote_root.trim().is_empty() {
            return Err(ConfigError::Missing("remote_root"));
        }
        if self.manifest_file_name.trim().is_empty() {
            return Err(ConfigError::Missing("manifest_file_name"));
        }
        if self.manifest_file_name.contains('/') {
            return Err(ConfigError::Invalid {
                name: "manifest_file_name",
                reason: "must be a bare file name, not a path".to_string(),
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                name: "workers",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.protocol == Protocol::Ssh {
            if self.host.as_deref().map_or(true, |h| h.trim().is_empty()) {
                return Err(ConfigError::Missing("host"));
            }
            if self.user.as_deref().map_or(true, |u| u.trim().is_empty()) {
                return Err(ConfigError::Missing("user"));
            }
            if self.port == 0 {
                return Err(ConfigError::Invalid {
                    name: "port",
                    reason: "must be between 1 and 65535".to_string(),
                });
            }
        }

        Ok(())
    }
}
