//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dpt-audit",
    version,
    about = "Audit packaging-team repositories against team policy",
    long_about = "dpt-audit — checks a packaging team's repositories for branch layout, \
packaging metadata, release tags, upstream tracking, and notification hooks, \
and reports violations grouped by repository and by violation code.\n\n\
Configuration precedence: CLI > dpt-audit.toml > defaults.",
    after_help = "Examples:\n  dpt-audit audit --snapshots exports --archive archive.json\n  dpt-audit audit --output report > report.txt\n  dpt-audit rules",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current dpt-audit version.")]
    Version,
    /// Run the policy audit over a set of repository snapshots
    #[command(
        about = "Run the policy audit",
        long_about = "Evaluate every repository snapshot against the policy catalogue. \
Violations never abort the scan; a repository whose checks fail is reported \
with an internal-check-failure entry.",
        after_help = "Examples:\n  dpt-audit audit --snapshots exports\n  dpt-audit audit --output json --jobs 8"
    )]
    Audit {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Directory of per-repository snapshot exports")]
        snapshots: Option<String>,
        #[arg(long, help = "Archive index file mapping source packages to published versions")]
        archive: Option<String>,
        #[arg(long, help = "Output mode: human|json|report (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Worker pool size for snapshot fetches (default: 4)")]
        jobs: Option<usize>,
        #[arg(long, help = "Per-repository fetch timeout in seconds (default: 30)")]
        timeout: Option<u64>,
    },
    /// List the violation-code catalogue
    #[command(
        about = "List violation codes",
        long_about = "Print every violation code the audit can emit, in catalogue order. \
Codes are stable across releases."
    )]
    Rules,
}
