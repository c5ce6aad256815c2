//! Remote manifest retrieval

use skiff_core::Manifest;
use skiff_transport::{Transport, TransportError, remote_join};
use tracing::{debug, warn};

/// Fetch and parse the manifest published by a previous run
///
/// This never fails: absence, unreadability, an unparseable document, and
/// an unknown schema version all degrade to `None`, which the planner
/// treats as "upload everything". A sync must not be blocked by a manifest
/// that was lost or corrupted; it re-publishes a fresh one at the end.
pub async fn fetch_remote_manifest(
    transport: &dyn Transport,
    remote_root: &str,
    file_name: &str,
) -> Option<Manifest> {
    let path = remote_join(remote_root, file_name);

    match transport.exists(&path).await {
        Ok(false) => {
            debug!("No remote manifest at {path}; treating as first sync");
            return None;
        }
        Ok(true) => {}
        Err(e) => {
            // The check itself failed; the read below settles it
            debug!("Existence check for {path} failed ({e}); attempting read");
        }
    }

    let bytes = match transport.read_file(&path).await {
        Ok(bytes) => bytes,
        Err(TransportError::NotFound(_)) => {
            debug!("No remote manifest at {path}; treating as first sync");
            return None;
        }
        Err(e) => {
            warn!("Failed to read remote manifest {path}: {e}; falling back to full sync");
            return None;
        }
    };

    match Manifest::from_bytes(&bytes) {
        Ok(manifest) => {
            debug!("Loaded remote manifest with {} files", manifest.len());
            Some(manifest)
        }
        Err(e) => {
            warn!("Remote manifest {path} is unusable ({e}); falling back to full sync");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use skiff_core::{FileRecord, Fingerprint};
    use skiff_transport::{LocalTransport, TransportResult};
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    fn sample_manifest() -> Manifest {
        let mut files = BTreeMap::new();
        files.insert(
            "a.txt".to_string(),
            FileRecord {
                fingerprint: Fingerprint::from_bytes(b"alpha"),
                size: 5,
                modified_at: "2026-03-01T10:00:00Z".parse().unwrap(),
                source: None,
            },
        );
        Manifest::new(files)
    }

    #[tokio::test]
    async fn test_absent_manifest_is_none() {
        let remote = TempDir::new().unwrap();
        let transport = LocalTransport::new();

        let got = fetch_remote_manifest(
            &transport,
            remote.path().to_str().unwrap(),
            ".skiff-manifest.json",
        )
        .await;
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_valid_manifest_is_loaded() {
        let remote = TempDir::new().unwrap();
        let manifest = sample_manifest();
        std::fs::write(
            remote.path().join(".skiff-manifest.json"),
            manifest.to_bytes().unwrap(),
        )
        .unwrap();

        let transport = LocalTransport::new();
        let got = fetch_remote_manifest(
            &transport,
            remote.path().to_str().unwrap(),
            ".skiff-manifest.json",
        )
        .await;
        assert_eq!(got, Some(manifest));
    }

    #[tokio::test]
    async fn test_corrupted_manifest_is_none() {
        let remote = TempDir::new().unwrap();
        std::fs::write(remote.path().join(".skiff-manifest.json"), "{truncated").unwrap();

        let transport = LocalTransport::new();
        let got = fetch_remote_manifest(
            &transport,
            remote.path().to_str().unwrap(),
            ".skiff-manifest.json",
        )
        .await;
        assert!(got.is_none());
    }

    /// Delegates reads to [`LocalTransport`] but cannot answer existence
    /// checks
    struct NoExistsTransport {
        inner: LocalTransport,
    }

    #[async_trait]
    impl Transport for NoExistsTransport {
        async fn upload_file(&self, source: &Path, remote_path: &str) -> TransportResult<()> {
            self.inner.upload_file(source, remote_path).await
        }

        async fn delete_file(&self, remote_path: &str) -> TransportResult<()> {
            self.inner.delete_file(remote_path).await
        }

        async fn exists(&self, _remote_path: &str) -> TransportResult<bool> {
            Err(TransportError::Transfer(
                "existence checks unsupported".to_string(),
            ))
        }

        async fn read_file(&self, remote_path: &str) -> TransportResult<Bytes> {
            self.inner.read_file(remote_path).await
        }

        async fn make_dir_all(&self, remote_path: &str) -> TransportResult<()> {
            self.inner.make_dir_all(remote_path).await
        }
    }

    #[tokio::test]
    async fn test_failed_existence_check_falls_back_to_read() {
        let remote = TempDir::new().unwrap();
        let manifest = sample_manifest();
        std::fs::write(
            remote.path().join(".skiff-manifest.json"),
            manifest.to_bytes().unwrap(),
        )
        .unwrap();

        let transport = NoExistsTransport {
            inner: LocalTransport::new(),
        };
        let got = fetch_remote_manifest(
            &transport,
            remote.path().to_str().unwrap(),
            ".skiff-manifest.json",
        )
        .await;
        assert_eq!(got, Some(manifest));
    }

    #[tokio::test]
    async fn test_newer_schema_is_none() {
        let remote = TempDir::new().unwrap();
        std::fs::write(
            remote.path().join(".skiff-manifest.json"),
            br#"{"schemaVersion": "2", "generatedAt": "2026-03-01T10:00:00Z", "files": {}}"#,
        )
        .unwrap();

        let transport = LocalTransport::new();
        let got = fetch_remote_manifest(
            &transport,
            remote.path().to_str().unwrap(),
            ".skiff-manifest.json",
        )
        .await;
        assert!(got.is_none());
    }
}
