//! Configuration discovery and effective settings resolution.
//!
//! Reads `dpt-audit.toml|yaml|yml` from the start directory (or closest
//! ancestor) and merges it with CLI flags. Defaults:
//! - `snapshots`: `snapshots`
//! - `output`: `human`
//! - `jobs`: 4
//! - `timeout_secs`: 30
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `dpt-audit.toml|yaml`.
pub struct AuditConfig {
    /// Directory holding per-repository snapshot exports.
    pub snapshots: Option<String>,
    /// Archive index file (source package -> published version).
    pub archive: Option<String>,
    pub output: Option<String>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the audit command.
pub struct Effective {
    pub repo_root: PathBuf,
    pub snapshots: String,
    pub archive: Option<String>,
    pub output: String,
    pub jobs: usize,
    pub timeout_secs: u64,
}

/// Walk upward from `start` until a config file or `.git` directory marks
/// the root.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("dpt-audit.toml").exists()
            || cur.join("dpt-audit.yaml").exists()
            || cur.join("dpt-audit.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `AuditConfig` from `dpt-audit.toml` or `dpt-audit.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<AuditConfig> {
    let toml_path = root.join("dpt-audit.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: AuditConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["dpt-audit.yaml", "dpt-audit.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: AuditConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_snapshots: Option<&str>,
    cli_archive: Option<&str>,
    cli_output: Option<&str>,
    cli_jobs: Option<usize>,
    cli_timeout: Option<u64>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let snapshots = cli_snapshots
        .map(|s| s.to_string())
        .or(cfg.snapshots)
        .unwrap_or_else(|| "snapshots".to_string());

    let archive = cli_archive.map(|s| s.to_string()).or(cfg.archive);

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let jobs = cli_jobs.or(cfg.jobs).unwrap_or(4);
    let timeout_secs = cli_timeout.or(cfg.timeout_secs).unwrap_or(30);

    Effective {
        repo_root,
        snapshots,
        archive,
        output,
        jobs,
        timeout_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("dpt-audit.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
snapshots = "exports"
archive = "archive.json"
output = "json"
jobs = 8
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, None, None, None, None);
        assert_eq!(eff.snapshots, "exports");
        assert_eq!(eff.archive.as_deref(), Some("archive.json"));
        assert_eq!(eff.output, "json");
        assert_eq!(eff.jobs, 8);
        assert_eq!(eff.timeout_secs, 30);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("dpt-audit.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
snapshots: exports
timeout_secs: 5
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None, None, None);
        assert_eq!(eff.snapshots, "exports");
        assert_eq!(eff.output, "human");
        assert_eq!(eff.jobs, 4);
        assert_eq!(eff.timeout_secs, 5);
        assert!(eff.archive.is_none());
    }

    #[test]
    fn test_cli_takes_precedence_over_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("dpt-audit.toml")).unwrap();
        writeln!(f, "{}", r#"output = "json""#).unwrap();

        let eff = resolve_effective(root.to_str(), None, None, Some("report"), Some(2), None);
        assert_eq!(eff.output, "report");
        assert_eq!(eff.jobs, 2);
    }
}
