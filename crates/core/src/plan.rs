//! Diff engine: turns two manifests into a sync plan
//!
//! [`compare`] is a pure function over immutable inputs. It performs no I/O,
//! never touches a transport, and produces the same plan for the same pair
//! of manifests every time. Whether orphan deletions actually run is the
//! orchestrator's call; the plan only names them.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::manifest::Manifest;

/// Why a file is being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// Present locally, absent from the remote manifest
    New,
    /// Present on both sides with differing fingerprints
    Modified,
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// One queued upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadItem {
    /// Remote-relative path
    pub path: String,
    pub kind: UploadKind,
    /// Local location to read from, when the manifest recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Size in bytes, for progress reporting
    pub size: u64,
}

/// Per-kind tallies for a plan, including files that need no action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCounts {
    pub new: usize,
    pub modified: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

/// The minimal set of actions that makes the remote match the local tree
///
/// Uploads and deletions are sorted by path, so plans compare and print
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub uploads: Vec<UploadItem>,
    /// Remote-relative paths present remotely but not locally
    pub deletions: Vec<String>,
    pub counts: PlanCounts,
}

impl SyncPlan {
    /// Whether the plan requires no remote writes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.deletions.is_empty()
    }

    /// Total bytes across all queued uploads
    #[must_use]
    pub fn upload_bytes(&self) -> u64 {
        self.uploads.iter().map(|u| u.size).sum()
    }
}

/// Diff a freshly built local manifest against the previous remote one
///
/// A missing remote manifest (first sync, forced full sync, or an unusable
/// remote document) queues every local file as new. Change detection is by
/// fingerprint only: a record whose size or mtime moved but whose
/// fingerprint did not is unchanged.
#[must_use]
pub fn compare(local: &Manifest, remote: Option<&Manifest>) -> SyncPlan {
    let mut uploads = Vec::new();
    let mut deletions = Vec::new();
    let mut counts = PlanCounts::default();

    for (path, record) in &local.files {
        match remote.and_then(|m| m.files.get(path)) {
            None => {
                counts.new += 1;
                uploads.push(UploadItem {
                    path: path.clone(),
                    kind: UploadKind::New,
                    source: record.source.clone(),
                    size: record.size,
                });
            }
            Some(previous) if previous.fingerprint != record.fingerprint => {
                counts.modified += 1;
                uploads.push(UploadItem {
                    path: path.clone(),
                    kind: UploadKind::Modified,
                    source: record.source.clone(),
                    size: record.size,
                });
            }
            Some(_) => counts.unchanged += 1,
        }
    }

    if let Some(remote) = remote {
        for path in remote.files.keys() {
            if !local.files.contains_key(path) {
                deletions.push(path.clone());
            }
        }
    }
    counts.deleted = deletions.len();

    SyncPlan {
        uploads,
        deletions,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Fingerprint;
    use crate::manifest::FileRecord;
    use std::collections::BTreeMap;

    fn manifest(entries: &[(&str, &[u8])]) -> Manifest {
        let files = entries
            .iter()
            .map(|(path, data)| {
                (
                    (*path).to_string(),
                    FileRecord {
                        fingerprint: Fingerprint::from_bytes(data),
                        size: data.len() as u64,
                        modified_at: "2026-03-01T10:00:00Z".parse().unwrap(),
                        source: None,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        Manifest::new(files)
    }

    fn upload_paths(plan: &SyncPlan) -> Vec<&str> {
        plan.uploads.iter().map(|u| u.path.as_str()).collect()
    }

    #[test]
    fn test_identical_manifests_are_noop() {
        let local = manifest(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);
        let remote = local.clone();

        let plan = compare(&local, Some(&remote));
        assert!(plan.is_empty());
        assert_eq!(plan.counts.unchanged, 2);
        assert_eq!(plan.counts.new, 0);
        assert_eq!(plan.counts.modified, 0);
        assert_eq!(plan.counts.deleted, 0);
    }

    #[test]
    fn test_no_remote_queues_everything_as_new() {
        let local = manifest(&[("a.txt", b"alpha"), ("sub/b.txt", b"beta")]);

        let plan = compare(&local, None);
        assert_eq!(upload_paths(&plan), vec!["a.txt", "sub/b.txt"]);
        assert!(plan.uploads.iter().all(|u| u.kind == UploadKind::New));
        assert!(plan.deletions.is_empty());
        assert_eq!(plan.counts.new, 2);
        assert_eq!(plan.counts.unchanged, 0);
    }

    #[test]
    fn test_changed_fingerprint_is_modified() {
        let local = manifest(&[("a.txt", b"after")]);
        let remote = manifest(&[("a.txt", b"before")]);

        let plan = compare(&local, Some(&remote));
        assert_eq!(plan.uploads.len(), 1);
        assert_eq!(plan.uploads[0].kind, UploadKind::Modified);
        assert!(plan.deletions.is_empty());
        assert_eq!(plan.counts.modified, 1);
    }

    #[test]
    fn test_orphans_are_queued_for_deletion() {
        let local = manifest(&[]);
        let remote = manifest(&[("old/a.txt", b"a"), ("old/b.txt", b"b")]);

        let plan = compare(&local, Some(&remote));
        assert!(plan.uploads.is_empty());
        assert_eq!(plan.deletions, vec!["old/a.txt", "old/b.txt"]);
        assert_eq!(plan.counts.deleted, 2);
    }

    #[test]
    fn test_both_empty_is_noop() {
        let plan = compare(&manifest(&[]), Some(&manifest(&[])));
        assert!(plan.is_empty());
        assert_eq!(plan.counts, PlanCounts::default());
    }

    #[test]
    fn test_fingerprint_overrides_metadata() {
        let local = manifest(&[("a.txt", b"same")]);
        let mut remote = manifest(&[("a.txt", b"same")]);

        // Same content, wildly different metadata
        let record = remote.files.get_mut("a.txt").unwrap();
        record.size = 9999;
        record.modified_at = "1999-01-01T00:00:00Z".parse().unwrap();

        let plan = compare(&local, Some(&remote));
        assert!(plan.is_empty());
        assert_eq!(plan.counts.unchanged, 1);
    }

    #[test]
    fn test_mixed_plan() {
        let local = manifest(&[("a.txt", b"a1"), ("b.txt", b"b1")]);
        let remote = manifest(&[("a.txt", b"a1"), ("c.txt", b"c1")]);

        let plan = compare(&local, Some(&remote));
        assert_eq!(upload_paths(&plan), vec!["b.txt"]);
        assert_eq!(plan.uploads[0].kind, UploadKind::New);
        assert_eq!(plan.deletions, vec!["c.txt"]);
        assert_eq!(
            plan.counts,
            PlanCounts {
                new: 1,
                modified: 0,
                deleted: 1,
                unchanged: 1,
            }
        );
    }

    #[test]
    fn test_compare_is_deterministic() {
        let local = manifest(&[("a.txt", b"x"), ("b.txt", b"y"), ("c.txt", b"z")]);
        let remote = manifest(&[("b.txt", b"changed"), ("d.txt", b"gone")]);

        let first = compare(&local, Some(&remote));
        let second = compare(&local, Some(&remote));
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_is_path_sorted() {
        let local = manifest(&[("z.txt", b"z"), ("a.txt", b"a"), ("m/n.txt", b"n")]);
        let remote = manifest(&[("x.txt", b"x"), ("b.txt", b"b")]);

        let plan = compare(&local, Some(&remote));
        assert_eq!(upload_paths(&plan), vec!["a.txt", "m/n.txt", "z.txt"]);
        assert_eq!(plan.deletions, vec!["b.txt", "x.txt"]);
    }

    #[test]
    fn test_upload_bytes_totals() {
        let local = manifest(&[("a.txt", b"12345"), ("b.txt", b"123")]);
        let plan = compare(&local, None);
        assert_eq!(plan.upload_bytes(), 8);
    }
}
