//! skiff-sync: the sync orchestrator
//!
//! Ties the core primitives and a transport together into one run: build
//! the local manifest, retrieve the remote one, diff, execute, publish.

pub mod engine;
pub mod retrieve;

pub use engine::{NullObserver, SyncError, SyncObserver, SyncOutcome, sync};
pub use retrieve::fetch_remote_manifest;
