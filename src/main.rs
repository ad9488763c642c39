//! dpt-audit CLI binary entry point.
//! Delegates to the scan driver and printers.

mod aggregate;
mod cli;
mod config;
mod engine;
mod models;
mod output;
mod provider;
mod report;
mod rules;
mod scan;
mod utils;
mod version;

use clap::Parser;
use cli::{Cli, Commands};
use models::violation::codes;
use provider::{ArchiveIndexResolver, JsonExportProvider, SnapshotProvider, VersionResolver};
use scan::ScanOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Rules => {
            for code in codes::ALL {
                println!("{}", code);
            }
        }
        Commands::Audit {
            repo_root,
            snapshots,
            archive,
            output,
            jobs,
            timeout,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                snapshots.as_deref(),
                archive.as_deref(),
                output.as_deref(),
                jobs,
                timeout,
            );
            if config::load_config(&eff.repo_root).is_none() {
                eprintln!(
                    "{} {}",
                    utils::note_prefix(),
                    "No dpt-audit.toml found; using defaults."
                );
            }
            let snapshots_dir = eff.repo_root.join(&eff.snapshots);
            if !snapshots_dir.is_dir() {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!(
                        "Snapshot directory not found: {} (pass --snapshots or configure dpt-audit.toml)",
                        snapshots_dir.to_string_lossy()
                    )
                );
                std::process::exit(2);
            }

            let resolver: Arc<dyn VersionResolver> = match &eff.archive {
                Some(path) => {
                    let archive_path = eff.repo_root.join(path);
                    match ArchiveIndexResolver::load(&archive_path) {
                        Ok(r) => Arc::new(r),
                        Err(err) => {
                            eprintln!("{} {:#}", utils::error_prefix(), err);
                            std::process::exit(2);
                        }
                    }
                }
                None => {
                    eprintln!(
                        "{} {}",
                        utils::note_prefix(),
                        "No archive index configured; published-version rules will be skipped."
                    );
                    Arc::new(ArchiveIndexResolver::empty())
                }
            };

            let provider: Arc<dyn SnapshotProvider> = Arc::new(JsonExportProvider::new(snapshots_dir));
            let options = ScanOptions {
                jobs: eff.jobs,
                fetch_timeout: Duration::from_secs(eff.timeout_secs),
            };
            let outcome = match scan::run_scan(provider, resolver, &options) {
                Ok(o) => o,
                Err(err) => {
                    eprintln!("{} {:#}", utils::error_prefix(), err);
                    std::process::exit(2);
                }
            };
            let has_errors = outcome.index.has_errors();
            output::print_audit(&outcome, &eff.output);
            if has_errors {
                std::process::exit(1);
            }
        }
    }
}
