//! Cargo-style progress output
//!
//! Displays progress in the familiar cargo format:
//! ```text
//!      Scanned 952 local files
//!      Planned 14 new, 3 modified, 1 orphaned, 934 unchanged
//!    Uploading [======>                  ] 5/17 css/site.css
//!       Synced 17 uploaded, 1 deleted in 3.2s
//! ```

use std::io::Write as _;
use std::sync::Mutex;
use std::time::Duration;

use skiff_core::{SyncPlan, UploadItem};
use skiff_sync::{SyncObserver, SyncOutcome};

/// Status verbs for cargo-style output (right-aligned to 12 chars)
struct Status;

impl Status {
    const SCANNED: &str = "Scanned";
    const PLANNED: &str = "Planned";
    const UPLOADING: &str = "Uploading";
    const DELETING: &str = "Deleting";
    const SYNCED: &str = "Synced";
}

/// Print a cargo-style status line
fn print_status(status: &str, message: &str) {
    let mut term = console::Term::stderr();
    let style = console::Style::new().green().bold();
    let _ = writeln!(term, "{:>12} {}", style.apply_to(status), message);
}

/// Terminal reporter wired into the engine's observer hooks
///
/// Upload callbacks can arrive from concurrent tasks, so the bar handle
/// lives behind a mutex.
pub struct ProgressReporter {
    bar: Mutex<Option<indicatif::ProgressBar>>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    /// Show the final summary and tear down any live bar
    pub fn finish(&self, outcome: &SyncOutcome) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }

        if outcome.dry_run {
            for item in &outcome.plan.uploads {
                eprintln!("+ {} ({})", item.path, item.kind);
            }
            for path in &outcome.plan.deletions {
                eprintln!("- {path}");
            }
            print_status(
                Status::PLANNED,
                &format!(
                    "dry run: {} to upload, {} orphaned, nothing touched",
                    outcome.plan.uploads.len(),
                    outcome.plan.deletions.len()
                ),
            );
        } else {
            print_status(
                Status::SYNCED,
                &format!(
                    "{} uploaded, {} deleted in {}",
                    outcome.uploaded,
                    outcome.deleted,
                    format_elapsed(outcome.elapsed)
                ),
            );
        }
    }
}

impl SyncObserver for ProgressReporter {
    fn scanned(&self, files: usize) {
        print_status(Status::SCANNED, &format!("{files} local files"));
    }

    fn planned(&self, plan: &SyncPlan) {
        print_status(
            Status::PLANNED,
            &format!(
                "{} new, {} modified, {} orphaned, {} unchanged",
                plan.counts.new, plan.counts.modified, plan.counts.deleted, plan.counts.unchanged
            ),
        );

        if plan.uploads.is_empty() {
            return;
        }

        let bar = indicatif::ProgressBar::new(plan.uploads.len() as u64);
        bar.set_style(
            indicatif::ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} {msg:>12} [{bar:25.cyan/dim}] {pos}/{len} {prefix:.dim}",
                )
                .expect("valid template")
                .progress_chars("=> "),
        );
        bar.set_message(Status::UPLOADING);
        bar.set_prefix(humansize::format_size(
            plan.upload_bytes(),
            humansize::BINARY,
        ));
        bar.enable_steady_tick(Duration::from_millis(100));
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn upload_started(&self, item: &UploadItem) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.set_prefix(item.path.clone());
        }
    }

    fn upload_finished(&self, _item: &UploadItem) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.inc(1);
        }
    }

    fn deleting(&self, path: &str) {
        print_status(Status::DELETING, path);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}
