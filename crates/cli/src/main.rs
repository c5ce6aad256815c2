//! skiff: manifest-driven one-way file synchronization
//!
//! Pushes a local tree to a remote root and publishes a manifest of
//! content fingerprints alongside it. The next run diffs against that
//! manifest, so only new and changed files travel and the remote tree is
//! never listed.

mod progress;

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand, builder::Styles};
use color_eyre::Result;
use tracing::info;

use skiff_core::{CONFIG_FILE, Manifest, Protocol, SyncConfig, Walker};
use skiff_sync::sync;

use crate::progress::ProgressReporter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::Red.on_default());

#[derive(Parser)]
#[command(name = "skiff")]
#[command(version)]
#[command(styles = STYLES)]
#[command(about = "Manifest-driven one-way file sync for deploys")]
#[command(long_about = r#"
skiff pushes a local tree to a remote root and leaves behind a manifest
of content fingerprints. The next run diffs against that manifest, so
only new and changed files are transferred and the remote tree is never
listed.

Examples:
  skiff sync                      Sync using ./skiff.toml
  skiff sync --dry-run            Show the plan without uploading
  skiff sync --delete             Also remove remote orphans
  skiff scan ./site               Fingerprint a tree and print it
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the local tree to the remote root
    Sync {
        /// Config file path
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,

        /// Plan and report without touching the remote
        #[arg(long)]
        dry_run: bool,

        /// Delete remote files that no longer exist locally
        #[arg(long)]
        delete: bool,

        /// Ignore the remote manifest and upload everything
        #[arg(long)]
        full: bool,

        /// Concurrent upload limit
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Walk and fingerprint a local tree, then print its manifest
    Scan {
        /// Directory to scan
        path: PathBuf,

        /// Output format (json, summary)
        #[arg(short, long, default_value = "summary")]
        format: String,
    },

    /// Show version and build info
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Version => {
            eprintln!("skiff {}", env!("CARGO_PKG_VERSION"));
            eprintln!("Built with Rust {}", env!("CARGO_PKG_RUST_VERSION"));
        }
        Commands::Scan { path, format } => {
            scan_command(&path, &format)?;
        }
        Commands::Sync {
            config,
            dry_run,
            delete,
            full,
            workers,
        } => {
            sync_command(&config, dry_run, delete, full, workers).await?;
        }
    }

    Ok(())
}

fn scan_command(path: &PathBuf, format: &str) -> Result<()> {
    info!("Scanning {}...", path.display());

    let entries = Walker::new(path).walk()?;
    let manifest = Manifest::build(&entries)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&manifest)?;
            eprintln!("{json}");
        }
        _ => {
            let total: u64 = manifest.files.values().map(|f| f.size).sum();
            eprintln!("Files: {}", manifest.len());
            eprintln!(
                "Total size: {}",
                humansize::format_size(total, humansize::BINARY)
            );

            if manifest.len() <= 20 {
                eprintln!("\nFiles:");
                for (path, record) in &manifest.files {
                    eprintln!(
                        "  {} {} ({})",
                        record.fingerprint,
                        path,
                        humansize::format_size(record.size, humansize::BINARY)
                    );
                }
            }
        }
    }

    Ok(())
}

async fn sync_command(
    config_path: &PathBuf,
    dry_run: bool,
    delete: bool,
    full: bool,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = SyncConfig::load(config_path)?;
    apply_overrides(&mut config, dry_run, delete, full, workers);
    config.validate()?;

    info!(
        "Syncing {} -> {}",
        config.local_root.display(),
        describe_target(&config)
    );

    let transport = skiff_transport::connect(&config).await?;
    let reporter = ProgressReporter::new();
    let outcome = sync(&config, transport.as_ref(), &reporter).await?;
    reporter.finish(&outcome);

    Ok(())
}

/// Flags win over the config file, but only when actually given
fn apply_overrides(
    config: &mut SyncConfig,
    dry_run: bool,
    delete: bool,
    full: bool,
    workers: Option<usize>,
) {
    if dry_run {
        config.dry_run = true;
    }
    if delete {
        config.delete_orphaned = true;
    }
    if full {
        config.force_full_sync = true;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
}

/// Human-readable description of where a sync is headed
fn describe_target(config: &SyncConfig) -> String {
    match config.protocol {
        Protocol::Ssh => format!(
            "{}@{}:{}",
            config.user.as_deref().unwrap_or("?"),
            config.host.as_deref().unwrap_or("?"),
            config.remote_root
        ),
        Protocol::Local => config.remote_root.clone(),
    }
}
