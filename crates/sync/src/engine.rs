//! Sync orchestrator
//!
//! Drives one run end to end: walk and fingerprint the local tree, fetch
//! the previous manifest, diff, execute the plan over the transport, and
//! publish the new manifest. Publication is last on purpose: if anything
//! fails mid-plan, the old manifest stays authoritative and the next run
//! simply re-uploads whatever is still missing.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use futures::TryStreamExt;
use thiserror::Error;
use tracing::{debug, info};

use skiff_core::{
    ConfigError, Manifest, ManifestError, ScanError, SyncConfig, SyncPlan, UploadItem, Walker,
    compare,
};
use skiff_transport::{Transport, TransportError, remote_join};

use crate::retrieve::fetch_remote_manifest;

/// Engine-level failures
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to stage manifest for upload")]
    Stage(#[source] std::io::Error),
}

/// Progress callbacks for a run
///
/// All methods default to no-ops. Upload callbacks may arrive from
/// concurrent tasks.
pub trait SyncObserver: Send + Sync {
    /// The local tree has been walked and fingerprinted
    fn scanned(&self, _files: usize) {}
    /// The plan is known; execution has not started
    fn planned(&self, _plan: &SyncPlan) {}
    fn upload_started(&self, _item: &UploadItem) {}
    fn upload_finished(&self, _item: &UploadItem) {}
    fn deleting(&self, _path: &str) {}
}

/// Observer that ignores every event
pub struct NullObserver;

impl SyncObserver for NullObserver {}

/// What a run did (or, for dry runs, would have done)
#[derive(Debug)]
pub struct SyncOutcome {
    pub plan: SyncPlan,
    /// Files actually uploaded; zero on dry runs
    pub uploaded: usize,
    /// Orphans actually deleted; zero unless `delete_orphaned` is set
    pub deleted: usize,
    pub dry_run: bool,
    pub elapsed: Duration,
}

/// Run one sync
///
/// The transport is disconnected best-effort on the way out, whether the
/// run succeeded or not.
///
/// # Errors
/// Returns an error on invalid configuration, local read failures, or any
/// failed remote operation. A failed upload or deletion aborts the rest of
/// the plan; completed uploads stay in place and no manifest is published.
pub async fn sync(
    config: &SyncConfig,
    transport: &dyn Transport,
    observer: &dyn SyncObserver,
) -> Result<SyncOutcome, SyncError> {
    let result = run(config, transport, observer).await;
    transport.disconnect().await;
    result
}

async fn run(
    config: &SyncConfig,
    transport: &dyn Transport,
    observer: &dyn SyncObserver,
) -> Result<SyncOutcome, SyncError> {
    let started = Instant::now();
    config.validate()?;

    // The manifest name is reserved: a local file with that name at the
    // root would be overwritten by the published document anyway.
    let entries = Walker::new(&config.local_root)
        .excludes(&config.exclude)
        .exclude(format!("/{}", config.manifest_file_name))
        .walk()?;
    let local = Manifest::build(&entries)?;
    observer.scanned(local.len());
    info!("Scanned {} local files", local.len());

    let remote = if config.force_full_sync {
        info!("Full sync forced; ignoring any remote manifest");
        None
    } else {
        fetch_remote_manifest(transport, &config.remote_root, &config.manifest_file_name).await
    };

    let plan = compare(&local, remote.as_ref());
    observer.planned(&plan);
    info!(
        "Planned {} new, {} modified, {} orphaned, {} unchanged",
        plan.counts.new, plan.counts.modified, plan.counts.deleted, plan.counts.unchanged
    );

    if config.dry_run {
        return Ok(SyncOutcome {
            plan,
            uploaded: 0,
            deleted: 0,
            dry_run: true,
            elapsed: started.elapsed(),
        });
    }

    // Directories first, sequentially: scp does not create them, and
    // concurrent mkdir cannot be assumed idempotent on every remote.
    transport.make_dir_all(&config.remote_root).await?;
    for dir in required_dirs(&plan) {
        transport
            .make_dir_all(&remote_join(&config.remote_root, &dir))
            .await?;
    }

    futures::stream::iter(plan.uploads.iter().map(Ok::<_, SyncError>))
        .try_for_each_concurrent(config.workers, |item| {
            let source = item
                .source
                .clone()
                .unwrap_or_else(|| config.local_root.join(&item.path));
            let remote_path = remote_join(&config.remote_root, &item.path);
            async move {
                observer.upload_started(item);
                debug!("Uploading {} ({})", item.path, item.kind);
                transport.upload_file(&source, &remote_path).await?;
                observer.upload_finished(item);
                Ok(())
            }
        })
        .await?;
    let uploaded = plan.uploads.len();

    let mut deleted = 0;
    if config.delete_orphaned {
        for path in &plan.deletions {
            observer.deleting(path);
            debug!("Deleting {path}");
            transport
                .delete_file(&remote_join(&config.remote_root, path))
                .await?;
            deleted += 1;
        }
    } else if !plan.deletions.is_empty() {
        debug!(
            "Keeping {} orphaned remote files (delete_orphaned is off)",
            plan.deletions.len()
        );
    }

    publish_manifest(config, transport, &local).await?;

    Ok(SyncOutcome {
        plan,
        uploaded,
        deleted,
        dry_run: false,
        elapsed: started.elapsed(),
    })
}

/// Deduplicated parent directories of every planned upload, sorted so
/// parents precede children
fn required_dirs(plan: &SyncPlan) -> Vec<String> {
    let mut dirs = BTreeSet::new();
    for item in &plan.uploads {
        if let Some((dir, _file)) = item.path.rsplit_once('/') {
            dirs.insert(dir.to_string());
        }
    }
    dirs.into_iter().collect()
}

/// Serialize the local manifest and upload it as the new remote manifest
async fn publish_manifest(
    config: &SyncConfig,
    transport: &dyn Transport,
    manifest: &Manifest,
) -> Result<(), SyncError> {
    let bytes = manifest.to_bytes()?;
    let staged = tempfile::NamedTempFile::new().map_err(SyncError::Stage)?;
    tokio::fs::write(staged.path(), &bytes)
        .await
        .map_err(SyncError::Stage)?;

    let remote_path = remote_join(&config.remote_root, &config.manifest_file_name);
    transport.upload_file(staged.path(), &remote_path).await?;
    info!("Published manifest with {} files", manifest.len());
    Ok(())
}
