//! Scan driver: fetch, evaluate, aggregate.
//!
//! Repositories are processed in sorted name order by a bounded worker
//! pool (the data source is a shared remote service, keep the pool small).
//! The only slow step is the snapshot fetch; it runs on a side thread and
//! is abandoned on timeout so a hung fetch never blocks a worker. Every
//! per-repository failure becomes an `internal-check-failure` violation,
//! so the report always carries an entry for it and the scan never aborts.

use crate::aggregate::ViolationAggregator;
use crate::engine;
use crate::models::snapshot::{ExternalFacts, RepositorySnapshot};
use crate::models::violation::ViolationIndex;
use crate::provider::{self, SnapshotProvider, VersionResolver};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Driver knobs, resolved from CLI/config before the scan starts.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub jobs: usize,
    pub fetch_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            jobs: 4,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the printers need after a scan.
pub struct ScanOutcome {
    pub index: ViolationIndex,
    pub processed: usize,
    pub finished_at: DateTime<Utc>,
}

/// Fetch one snapshot on a side thread, abandoning it on timeout.
fn fetch_with_timeout(
    provider: &Arc<dyn SnapshotProvider>,
    name: &str,
    timeout: Duration,
) -> Result<RepositorySnapshot> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let provider = Arc::clone(provider);
    let name = name.to_string();
    std::thread::spawn(move || {
        let _ = tx.send(provider.fetch(&name));
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => bail!("snapshot fetch timed out after {:?}", timeout),
    }
}

/// Run the full audit over every repository the provider knows about.
pub fn run_scan(
    provider: Arc<dyn SnapshotProvider>,
    resolver: Arc<dyn VersionResolver>,
    options: &ScanOptions,
) -> Result<ScanOutcome> {
    let mut names = provider.list_repositories()?;
    names.sort();
    tracing::info!("auditing {} repositories", names.len());

    let aggregator = ViolationAggregator::new();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.max(1))
        .build()
        .context("building scan worker pool")?;

    pool.install(|| {
        names.par_iter().for_each(|name| {
            tracing::info!("checking {}", name);
            let snapshot = match fetch_with_timeout(&provider, name, options.fetch_timeout) {
                Ok(s) => s,
                Err(err) => {
                    tracing::warn!("fetch failed for {}: {:#}", name, err);
                    aggregator.add(engine::internal_failure(
                        name,
                        "snapshot-fetch",
                        &format!("{:#}", err),
                    ));
                    return;
                }
            };
            // Archive lookup goes by source package name, falling back to
            // the repository name when control has no Source field.
            let source = snapshot
                .control_fields
                .get("Source")
                .cloned()
                .unwrap_or_else(|| snapshot.name.clone());
            let facts = match provider::resolve_facts(resolver.as_ref(), &source) {
                Ok(f) => f,
                Err(err) => {
                    tracing::warn!("version resolution failed for {}: {:#}", source, err);
                    ExternalFacts::default()
                }
            };
            for violation in engine::run(&snapshot, &facts) {
                aggregator.add(violation);
            }
        });
    });

    Ok(ScanOutcome {
        index: aggregator.into_index(),
        processed: names.len(),
        finished_at: Utc::now(),
    })
}
