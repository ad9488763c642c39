//! Violations and the indexes built over them.
//!
//! Every finding carries a code from the closed catalogue in [`codes`].
//! Codes are stable across releases: a new rule adds a new code, existing
//! codes are never reused or renumbered, so reports stay diffable across
//! runs.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Severity of a single violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

/// One reported policy failure for one repository.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub repository: String,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl Violation {
    pub fn error(repository: &str, code: &'static str, message: impl Into<String>) -> Self {
        Violation {
            repository: repository.to_string(),
            severity: Severity::Error,
            code,
            message: message.into(),
            extra: None,
        }
    }

    pub fn warning(repository: &str, code: &'static str, message: impl Into<String>) -> Self {
        Violation {
            repository: repository.to_string(),
            severity: Severity::Warning,
            code,
            message: message.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }
}

/// The closed violation-code catalogue.
pub mod codes {
    pub const EMPTY_REPOSITORY: &str = "empty-repository";
    pub const MASTER_BRANCH_MISSING: &str = "master-branch-missing";
    pub const MASTER_BRANCH_LEGACY: &str = "master-branch-legacy";
    pub const UPSTREAM_BRANCH_MISSING: &str = "upstream-branch-missing";
    pub const NO_PRISTINE_TAR_BRANCH: &str = "no-pristine-tar-branch";
    pub const METADATA_DIRECTORY_MISSING: &str = "metadata-directory-missing";
    pub const SOURCE_NAME_MISMATCH: &str = "source-name-mismatch";
    pub const UPLOADERS_MISSING: &str = "uploaders-missing";
    pub const TEAM_MAINTAINER_MISSING: &str = "team-maintainer-missing";
    pub const TEAM_MAINTAINER_DEPRECATED: &str = "team-maintainer-deprecated";
    pub const VCS_BROWSER_MISSING: &str = "vcs-browser-missing";
    pub const VCS_BROWSER_MISMATCH: &str = "vcs-browser-mismatch";
    pub const VCS_GIT_MISSING: &str = "vcs-git-missing";
    pub const VCS_GIT_MISMATCH: &str = "vcs-git-mismatch";
    pub const WATCH_FILE_MISSING: &str = "watch-file-missing";
    pub const WATCH_FILE_UNPARSABLE: &str = "watch-file-unparsable";
    pub const WATCH_FILE_DEPRECATED_HOST: &str = "watch-file-deprecated-host";
    pub const PUBLISHED_VERSION_UNRESOLVED: &str = "published-version-unresolved";
    pub const DEBIAN_TAG_MISSING: &str = "debian-tag-missing";
    pub const UPSTREAM_TAG_MISSING: &str = "upstream-tag-missing";
    pub const CHANGELOG_VERSION_MISSING: &str = "changelog-version-missing";
    pub const PRISTINE_TAR_DELTA_MISSING: &str = "pristine-tar-delta-missing";
    pub const PRISTINE_TAR_ID_MISSING: &str = "pristine-tar-id-missing";
    pub const TAGPENDING_HOOK_MISSING: &str = "tagpending-hook-missing";
    pub const KGB_HOOK_MISSING: &str = "kgb-hook-missing";
    pub const EMAILS_ON_PUSH_MISSING: &str = "emails-on-push-missing";
    pub const IRKER_INTEGRATION_ACTIVE: &str = "irker-integration-active";
    pub const PEP517_PLUGIN_MISSING: &str = "pep517-plugin-missing";
    pub const INTERNAL_CHECK_FAILURE: &str = "internal-check-failure";

    /// Every code, in catalogue order.
    pub const ALL: &[&str] = &[
        EMPTY_REPOSITORY,
        MASTER_BRANCH_MISSING,
        MASTER_BRANCH_LEGACY,
        UPSTREAM_BRANCH_MISSING,
        NO_PRISTINE_TAR_BRANCH,
        METADATA_DIRECTORY_MISSING,
        SOURCE_NAME_MISMATCH,
        UPLOADERS_MISSING,
        TEAM_MAINTAINER_MISSING,
        TEAM_MAINTAINER_DEPRECATED,
        VCS_BROWSER_MISSING,
        VCS_BROWSER_MISMATCH,
        VCS_GIT_MISSING,
        VCS_GIT_MISMATCH,
        WATCH_FILE_MISSING,
        WATCH_FILE_UNPARSABLE,
        WATCH_FILE_DEPRECATED_HOST,
        PUBLISHED_VERSION_UNRESOLVED,
        DEBIAN_TAG_MISSING,
        UPSTREAM_TAG_MISSING,
        CHANGELOG_VERSION_MISSING,
        PRISTINE_TAR_DELTA_MISSING,
        PRISTINE_TAR_ID_MISSING,
        TAGPENDING_HOOK_MISSING,
        KGB_HOOK_MISSING,
        EMAILS_ON_PUSH_MISSING,
        IRKER_INTEGRATION_ACTIVE,
        PEP517_PLUGIN_MISSING,
        INTERNAL_CHECK_FAILURE,
    ];
}

/// Insertion-ordered map from a key to the entries recorded under it.
///
/// Backed by a vector of `(key, entries)` pairs plus a position map, so
/// iteration follows first-insertion order and appends stay O(1) amortized.
#[derive(Debug, Clone, Serialize)]
pub struct OrderedGroups<T> {
    entries: Vec<(String, Vec<T>)>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl<T> Default for OrderedGroups<T> {
    fn default() -> Self {
        OrderedGroups {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> OrderedGroups<T> {
    pub fn push(&mut self, key: &str, value: T) {
        match self.positions.get(key) {
            Some(&i) => self.entries[i].1.push(value),
            None => {
                self.positions.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), vec![value]));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn get(&self, key: &str) -> Option<&[T]> {
        self.positions.get(key).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two views the aggregator maintains over the same flat sequence of
/// violations: by repository and by violation code.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViolationIndex {
    pub by_repository: OrderedGroups<Violation>,
    pub by_code: OrderedGroups<String>,
    total: usize,
}

impl ViolationIndex {
    /// Record one violation in both views.
    pub fn record(&mut self, violation: Violation) {
        let repo = violation.repository.clone();
        self.by_code.push(violation.code, repo.clone());
        self.by_repository.push(&repo, violation);
        self.total += 1;
    }

    /// Total number of violations recorded.
    pub fn total(&self) -> usize {
        self.total
    }

    /// True when any recorded violation has ERROR severity.
    pub fn has_errors(&self) -> bool {
        self.by_repository
            .iter()
            .any(|(_, vs)| vs.iter().any(|v| v.severity == Severity::Error))
    }

    /// Count violations of the given severity.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.by_repository
            .iter()
            .map(|(_, vs)| vs.iter().filter(|v| v.severity == severity).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_groups_preserve_insertion_order() {
        let mut g: OrderedGroups<u32> = OrderedGroups::default();
        g.push("b", 1);
        g.push("a", 2);
        g.push("b", 3);
        let keys: Vec<&str> = g.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(g.get("b"), Some(&[1, 3][..]));
    }

    #[test]
    fn test_index_records_both_views() {
        let mut idx = ViolationIndex::default();
        idx.record(Violation::error("repo1", codes::EMPTY_REPOSITORY, "empty"));
        idx.record(Violation::warning("repo2", codes::UPLOADERS_MISSING, "no uploaders"));
        idx.record(Violation::error("repo1", codes::NO_PRISTINE_TAR_BRANCH, "no branch"));
        assert_eq!(idx.total(), 3);
        assert_eq!(idx.by_repository.get("repo1").unwrap().len(), 2);
        assert_eq!(
            idx.by_code.get(codes::UPLOADERS_MISSING),
            Some(&["repo2".to_string()][..])
        );
        assert!(idx.has_errors());
        assert_eq!(idx.count_severity(Severity::Warning), 1);
    }

    #[test]
    fn test_catalogue_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in codes::ALL {
            assert!(seen.insert(code), "duplicate code {code}");
        }
    }
}
