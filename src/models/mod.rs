//! Shared data models: repository snapshots, violations, and scan output.

pub mod snapshot;
pub mod violation;

use serde::Serialize;

#[derive(Serialize)]
/// Aggregated scan summary used by printers.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub repositories: usize,
    pub flagged: usize,
}
