//! dpt-audit core library.
//!
//! Audits a packaging team's repositories against a fixed policy catalogue
//! and builds a report grouped by repository and by violation code.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `version`: Debian version parsing and total ordering.
//! - `models`: Snapshots, violations, the violation-code catalogue.
//! - `rules`: The policy rule catalogue, pure functions over a snapshot.
//! - `engine`: Ordered rule execution with fault isolation.
//! - `aggregate`: Thread-safe violation aggregation into dual indexes.
//! - `report`: Deterministic plain-text report rendering.
//! - `provider`: Collaborator seams and file-backed implementations.
//! - `scan`: The bounded-concurrency scan driver.
//! - `output`: Human/JSON/report printers.
//! - `utils`: Supporting helpers.
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod engine;
pub mod models;
pub mod output;
pub mod provider;
pub mod report;
pub mod rules;
pub mod scan;
pub mod utils;
pub mod version;
