//! Local tree walking with exclusion patterns via the `ignore` crate
//!
//! The walker decides the sync set: every file under the root except what
//! the exclude patterns reject. Patterns use gitignore syntax (including
//! `!` negation, last match wins) but the tree's own `.gitignore` files are
//! deliberately not consulted; a deploy syncs what is on disk, and the
//! exclusion list lives in configuration where it can be reviewed.

use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use ignore::gitignore::GitignoreBuilder;
use tracing::debug;

use crate::error::{ScanError, ScanResult};

/// One file selected for syncing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Location on the local filesystem
    pub source: PathBuf,
    /// Remote-relative path, forward slashes on every platform
    pub path: String,
}

/// Patterns excluded from every sync: VCS bookkeeping, dependency caches,
/// and OS cruft. User patterns are applied after these, so a negation like
/// `!.git/` can re-include one if a deploy really needs it.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/",
    ".hg/",
    ".svn/",
    ".bzr/",
    "__pycache__/",
    "node_modules/",
    ".DS_Store",
    "Thumbs.db",
];

/// Walker for the local tree
pub struct Walker {
    root: PathBuf,
    excludes: Vec<String>,
}

impl Walker {
    /// Create a walker rooted at the given directory, with the default
    /// exclusions preloaded
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excludes: DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Add an exclude pattern (gitignore syntax)
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Add several exclude patterns
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Walk the tree and return the sync set, sorted by remote path
    ///
    /// # Errors
    /// Returns an error if a pattern is malformed, traversal fails, or a
    /// file name cannot be represented as a remote path
    pub fn walk(&self) -> ScanResult<Vec<ScanEntry>> {
        let mut patterns = GitignoreBuilder::new(&self.root);
        for pattern in &self.excludes {
            patterns
                .add_line(None, pattern)
                .map_err(ScanError::Pattern)?;
        }
        let matcher = patterns.build().map_err(ScanError::Pattern)?;

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false) // Hidden files sync too (e.g. .htaccess)
            .git_ignore(false) // Exclusions come from config, not .gitignore
            .git_global(false)
            .git_exclude(false)
            .require_git(false)
            .filter_entry(move |entry| {
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    return true;
                };
                if relative.as_os_str().is_empty() {
                    return true; // the root itself
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !matcher.matched(relative, is_dir).is_ignore()
            });

        let mut entries = Vec::new();
        for result in builder.build() {
            let entry = result?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let remote_path = posix_path(relative)
                .ok_or_else(|| ScanError::NonUtf8Path(relative.to_path_buf()))?;

            entries.push(ScanEntry {
                source: path.to_path_buf(),
                path: remote_path,
            });
        }

        // Sort for deterministic ordering
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(root = %self.root.display(), files = entries.len(), "walk complete");
        Ok(entries)
    }
}

/// Render a relative path with forward slashes
fn posix_path(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        let Component::Normal(name) = component else {
            return None;
        };
        parts.push(name.to_str()?);
    }
    Some(parts.join("/"))
}
