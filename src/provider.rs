//! Collaborator seams: repository metadata and published-version lookup.
//!
//! The engine never fetches anything itself; it consumes
//! `RepositorySnapshot` values assembled here. The file-backed
//! implementations read per-repository JSON exports (produced by the
//! hosting-service tooling) and an archive index file, which keeps the
//! audit reproducible and the scan offline. Raw `debian/control` and
//! `debian/changelog` text is parsed at this boundary; a parse failure is
//! an error to the caller, never silently dropped.

use crate::models::snapshot::{ExternalFacts, Hook, RepositorySnapshot, Service};
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Lists repositories and produces one snapshot per repository.
pub trait SnapshotProvider: Send + Sync {
    fn list_repositories(&self) -> Result<Vec<String>>;
    fn fetch(&self, name: &str) -> Result<RepositorySnapshot>;
}

/// Resolves the currently published version of a source package.
/// `Ok(None)` means "not found", a first-class non-fatal state.
pub trait VersionResolver: Send + Sync {
    fn published_version(&self, source: &str) -> Result<Option<String>>;
}

/// On-disk shape of one exported repository, as written by the collector
/// tooling. Optional sections default to absent.
#[derive(Deserialize)]
pub struct RepoExport {
    pub name: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub git_url: String,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub branches: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub has_debian_directory: bool,
    /// Raw debian/control text, absent when the file does not exist.
    #[serde(default)]
    pub control: Option<String>,
    #[serde(default)]
    pub watch: Option<String>,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub pristine_tar_files: BTreeSet<String>,
    /// Absent when hook data was permission-gated.
    #[serde(default)]
    pub hooks: Option<Vec<HookExport>>,
    #[serde(default)]
    pub services: Option<Vec<ServiceExport>>,
    #[serde(default)]
    pub has_pyproject_toml: bool,
}

#[derive(Deserialize)]
pub struct HookExport {
    pub url: String,
}

#[derive(Deserialize)]
pub struct ServiceExport {
    pub title: String,
}

/// Parse the first (source) paragraph of a deb822 file into a field map.
///
/// Continuation lines (leading whitespace) extend the previous field.
/// Comment lines are dropped. Keys stay unique; a repeated key is a parse
/// error, as is a field line without a colon.
pub fn parse_deb822(text: &str) -> Result<HashMap<String, String>> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut last_key: Option<String> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            // end of the source paragraph
            if !fields.is_empty() {
                break;
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            let key = last_key
                .as_ref()
                .context("continuation line before any field")?;
            let value = fields.get_mut(key).expect("continued field exists");
            value.push('\n');
            value.push_str(line.trim());
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .with_context(|| format!("field line without a colon: '{}'", line))?;
        let key = key.trim().to_string();
        if fields.contains_key(&key) {
            bail!("repeated field '{}' in control paragraph", key);
        }
        fields.insert(key.clone(), value.trim().to_string());
        last_key = Some(key);
    }
    Ok(fields)
}

/// Extract the version of every changelog entry, in authored order.
///
/// Entry headers look like `pkgname (1.2.3-1) unstable; urgency=medium`.
/// Non-header lines are body text and are skipped.
pub fn parse_changelog_versions(text: &str) -> Vec<String> {
    let header = Regex::new(r"^\S+ \(([^)]+)\)").unwrap();
    text.lines()
        .filter_map(|line| header.captures(line))
        .map(|c| c[1].to_string())
        .collect()
}

/// Assemble an engine-facing snapshot from one raw export.
pub fn assemble(export: RepoExport) -> Result<RepositorySnapshot> {
    let control_fields = match &export.control {
        Some(text) => parse_deb822(text)
            .with_context(|| format!("unparsable debian/control in '{}'", export.name))?,
        None => HashMap::new(),
    };
    let changelog_versions = export
        .changelog
        .as_deref()
        .map(parse_changelog_versions)
        .unwrap_or_default();
    Ok(RepositorySnapshot {
        name: export.name,
        web_url: export.web_url,
        git_url: export.git_url,
        default_branch: export.default_branch,
        branches: export.branches,
        tags: export.tags,
        has_debian_directory: export.has_debian_directory,
        control_fields,
        watch_file: export.watch,
        changelog_versions,
        pristine_tar_files: export.pristine_tar_files,
        hooks: export
            .hooks
            .map(|hs| hs.into_iter().map(|h| Hook { url: h.url }).collect()),
        services: export
            .services
            .map(|ss| ss.into_iter().map(|s| Service { title: s.title }).collect()),
        has_pyproject_toml: export.has_pyproject_toml,
    })
}

/// Snapshot provider reading `<dir>/<name>.json` exports.
pub struct JsonExportProvider {
    dir: PathBuf,
}

impl JsonExportProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonExportProvider { dir: dir.into() }
    }
}

impl SnapshotProvider for JsonExportProvider {
    fn list_repositories(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("snapshot directory '{}'", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn fetch(&self, name: &str) -> Result<RepositorySnapshot> {
        let path = self.dir.join(format!("{}.json", name));
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading snapshot '{}'", path.display()))?;
        let export: RepoExport = serde_json::from_str(&text)
            .with_context(|| format!("unparsable snapshot export '{}'", path.display()))?;
        assemble(export)
    }
}

/// Version resolver backed by an archive index file: a JSON object mapping
/// source package names to their published version in sid.
pub struct ArchiveIndexResolver {
    versions: HashMap<String, String>,
}

impl ArchiveIndexResolver {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading archive index '{}'", path.display()))?;
        let versions: HashMap<String, String> = serde_json::from_str(&text)
            .with_context(|| format!("unparsable archive index '{}'", path.display()))?;
        Ok(ArchiveIndexResolver { versions })
    }

    /// An empty index; every lookup resolves to "not found".
    pub fn empty() -> Self {
        ArchiveIndexResolver {
            versions: HashMap::new(),
        }
    }
}

impl VersionResolver for ArchiveIndexResolver {
    fn published_version(&self, source: &str) -> Result<Option<String>> {
        Ok(self.versions.get(source).cloned())
    }
}

/// Resolve external facts for a snapshot, treating resolver failure as
/// "unresolved" (logged by the caller).
pub fn resolve_facts(resolver: &dyn VersionResolver, source: &str) -> Result<ExternalFacts> {
    Ok(ExternalFacts {
        published_version: resolver.published_version(source)?,
    })
}
