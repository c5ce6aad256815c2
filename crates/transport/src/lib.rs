//! skiff-transport: remote file operations behind one async trait
//!
//! The engine drives everything through [`Transport`]; the shipped
//! implementations are system ssh/scp and a local directory mirror.

pub mod local;
pub mod ssh;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use skiff_core::{Protocol, SyncConfig};

pub use local::LocalTransport;
pub use ssh::SshTransport;

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote could not be reached. Fatal; nothing was synced.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A read targeted a path the remote does not have
    #[error("remote file not found: {0}")]
    NotFound(String),

    /// An upload, deletion, or directory creation failed partway through
    /// the run
    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Capability set the sync engine needs from a remote
///
/// Remote paths are strings with forward slashes; how they map onto the
/// other side is the implementation's business. Methods take `&self` so
/// independent uploads can run concurrently over one connection handle.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Upload a local file to the given remote path
    ///
    /// Parent directories are not created here; callers create them first
    /// via [`Transport::make_dir_all`].
    ///
    /// # Errors
    /// Returns an error if the transfer fails
    async fn upload_file(&self, source: &Path, remote_path: &str) -> TransportResult<()>;

    /// Delete a remote file. Deleting a path that is already gone succeeds.
    ///
    /// # Errors
    /// Returns an error if the deletion fails
    async fn delete_file(&self, remote_path: &str) -> TransportResult<()>;

    /// Check whether a remote path exists
    ///
    /// # Errors
    /// Returns an error if the check cannot be performed; callers may fall
    /// back to an attempted read
    async fn exists(&self, remote_path: &str) -> TransportResult<bool>;

    /// Read a remote file into memory
    ///
    /// # Errors
    /// Returns [`TransportError::NotFound`] for missing files, an error
    /// otherwise
    async fn read_file(&self, remote_path: &str) -> TransportResult<Bytes>;

    /// Create a remote directory, including missing parents
    ///
    /// # Errors
    /// Returns an error if creation fails
    async fn make_dir_all(&self, remote_path: &str) -> TransportResult<()>;

    /// Best-effort shutdown; the default does nothing
    async fn disconnect(&self) {}
}

/// Connect the transport selected by the configuration
///
/// # Errors
/// Returns [`TransportError::Connection`] if the settings are unusable or
/// the remote cannot be reached
pub async fn connect(config: &SyncConfig) -> TransportResult<Box<dyn Transport>> {
    match config.protocol {
        Protocol::Ssh => {
            let host = config
                .host
                .as_deref()
                .ok_or_else(|| TransportError::Connection("ssh requires `host`".to_string()))?;
            let user = config
                .user
                .as_deref()
                .ok_or_else(|| TransportError::Connection("ssh requires `user`".to_string()))?;
            let transport =
                SshTransport::connect(host, config.port, user, config.key_path.as_deref()).await?;
            Ok(Box::new(transport))
        }
        Protocol::Local => Ok(Box::new(LocalTransport::new())),
    }
}

/// Join a remote-relative path onto a remote root
#[must_use]
pub fn remote_join(base: &str, rel: &str) -> String {
    if base.is_empty() {
        return rel.to_string();
    }
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() {
        format!("/{rel}")
    } else {
        format!("{trimmed}/{rel}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_join() {
        assert_eq!(remote_join("/srv/www", "a/b.txt"), "/srv/www/a/b.txt");
        assert_eq!(remote_join("/srv/www/", "a.txt"), "/srv/www/a.txt");
        assert_eq!(remote_join("/", "a.txt"), "/a.txt");
        assert_eq!(remote_join("", "a.txt"), "a.txt");
        assert_eq!(remote_join("relative/root", "x"), "relative/root/x");
    }

    #[tokio::test]
    async fn test_connect_local() {
        let config = SyncConfig {
            protocol: Protocol::Local,
            remote_root: "/tmp/anywhere".to_string(),
            ..SyncConfig::default()
        };
        assert!(connect(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_ssh_without_host() {
        let config = SyncConfig::default();
        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
