//! Local directory transport
//!
//! Treats the remote side as a directory on this machine. Used for deploys
//! to mounted folders and throughout the test suites, where it exercises
//! the same engine paths as SSH without a network.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Transport, TransportError, TransportResult};

/// Transport that mirrors into the local filesystem
///
/// Remote paths are interpreted as ordinary filesystem paths. Parent
/// directories are deliberately not created on upload, matching how scp
/// behaves; callers create them through [`Transport::make_dir_all`].
#[derive(Debug, Default)]
pub struct LocalTransport;

impl LocalTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn upload_file(&self, source: &Path, remote_path: &str) -> TransportResult<()> {
        tokio::fs::copy(source, remote_path)
            .await
            .map_err(|e| TransportError::Transfer(format!("copy to {remote_path} failed: {e}")))?;
        Ok(())
    }

    async fn delete_file(&self, remote_path: &str) -> TransportResult<()> {
        match tokio::fs::remove_file(remote_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TransportError::Transfer(format!(
                "deletion of {remote_path} failed: {e}"
            ))),
        }
    }

    async fn exists(&self, remote_path: &str) -> TransportResult<bool> {
        Ok(tokio::fs::try_exists(remote_path).await?)
    }

    async fn read_file(&self, remote_path: &str) -> TransportResult<Bytes> {
        match tokio::fs::read(remote_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TransportError::NotFound(remote_path.to_string()))
            }
            Err(e) => Err(TransportError::Transfer(format!(
                "read of {remote_path} failed: {e}"
            ))),
        }
    }

    async fn make_dir_all(&self, remote_path: &str) -> TransportResult<()> {
        tokio::fs::create_dir_all(remote_path)
            .await
            .map_err(|e| TransportError::Transfer(format!("mkdir of {remote_path} failed: {e}")))?;
        Ok(())
    }
}
