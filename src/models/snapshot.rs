//! Immutable per-repository inputs to one policy run.
//!
//! A `RepositorySnapshot` is assembled once by the provider layer from
//! whatever the hosting service exposed, then handed read-only to the
//! engine. Absent data is modeled explicitly: a missing watch file is
//! `None`, permission-gated hooks/integrations are `None` (as opposed to
//! an observed empty list).

use std::collections::{BTreeSet, HashMap};

/// A notification webhook configured on the repository.
#[derive(Debug, Clone)]
pub struct Hook {
    pub url: String,
}

/// A configured service integration (known by its display title).
#[derive(Debug, Clone)]
pub struct Service {
    pub title: String,
}

/// Everything observed about one repository during one scan pass.
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    pub name: String,
    pub web_url: String,
    pub git_url: String,
    pub default_branch: String,
    pub branches: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub has_debian_directory: bool,
    /// Parsed `debian/control` source-paragraph fields. Absence of a key
    /// is distinct from an empty value.
    pub control_fields: HashMap<String, String>,
    /// Raw `debian/watch` contents; `None` when the file does not exist.
    pub watch_file: Option<String>,
    /// Versions declared in `debian/changelog`, in authored order.
    pub changelog_versions: Vec<String>,
    /// File names on the pristine-tar branch. Only meaningful when that
    /// branch exists.
    pub pristine_tar_files: BTreeSet<String>,
    /// `None` when hook data was permission-gated and not collected.
    pub hooks: Option<Vec<Hook>>,
    /// `None` when integration data was permission-gated and not collected.
    pub services: Option<Vec<Service>>,
    pub has_pyproject_toml: bool,
}

/// Externally resolved facts about the source package, may be absent.
#[derive(Debug, Clone, Default)]
pub struct ExternalFacts {
    /// Version currently published in the archive (sid), unparsed.
    pub published_version: Option<String>,
}

impl RepositorySnapshot {
    /// A minimal snapshot for the given name, everything else empty.
    /// Mostly useful as a test base.
    pub fn bare(name: &str) -> Self {
        RepositorySnapshot {
            name: name.to_string(),
            web_url: String::new(),
            git_url: String::new(),
            default_branch: String::new(),
            branches: BTreeSet::new(),
            tags: BTreeSet::new(),
            has_debian_directory: false,
            control_fields: HashMap::new(),
            watch_file: None,
            changelog_versions: Vec::new(),
            pristine_tar_files: BTreeSet::new(),
            hooks: None,
            services: None,
            has_pyproject_toml: false,
        }
    }
}
