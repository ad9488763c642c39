//! The policy rule catalogue.
//!
//! Each rule is a pure function over the snapshot (plus parsed external
//! facts where version awareness is needed) returning the violations it
//! found. Rules never touch collaborators and never mutate their inputs;
//! the engine owns execution order and gating, see `engine.rs`.
//!
//! Policy constants (branch names, team identities, hook URLs) follow the
//! team's conventions on the hosting service.

use crate::models::snapshot::RepositorySnapshot;
use crate::models::violation::{codes, Violation};
use crate::version::Version;
use regex::Regex;

/// Branch names accepted as the Debian packaging branch (DEP-14).
pub const MASTER_BRANCHES: &[&str] = &["master", "debian/master", "debian/unstable", "debian/latest"];
/// Tolerated but non-canonical packaging branch names.
pub const LEGACY_MASTER_BRANCHES: &[&str] = &["sid", "debian/sid"];
/// Accepted upstream-tracking branch names.
pub const UPSTREAM_BRANCHES: &[&str] = &["upstream", "upstream/latest"];
pub const PRISTINE_TAR_BRANCH: &str = "pristine-tar";

/// Canonical team identity expected in Maintainer/Uploaders.
pub const TEAM_CANONICAL: &str = "team+python@tracker.debian.org";
/// Older team identities that still count as ownership but warrant a warning.
pub const TEAM_DEPRECATED: &[&str] = &[
    "python-modules-team@lists.alioth.debian.org",
    "python-apps-team@lists.alioth.debian.org",
];

/// Upstream-tracking hosts that still work but should be migrated away from.
pub const DEPRECATED_WATCH_HOSTS: &[&str] = &["pypi.debian.net"];

pub const TAGPENDING_HOOK_PREFIX: &str = "https://webhook.salsa.debian.org/tagpending/";
pub const KGB_HOOK_URL: &str = "http://kgb.debian.net:9418/webhook/?channel=debian-python-changes";
pub const EMAILS_ON_PUSH_TITLE: &str = "Emails on push";
pub const IRKER_TITLE: &str = "Irker (IRC gateway)";

/// Build helper expected in Build-Depends for pyproject.toml packages.
pub const PEP517_PLUGIN: &str = "pybuild-plugin-pyproject";

fn branch_list(s: &RepositorySnapshot) -> String {
    let names: Vec<&str> = s.branches.iter().map(String::as_str).collect();
    format!("available branches: [{}]", names.join(", "))
}

/// Rule 1: an empty repository short-circuits everything else.
pub fn empty_repository(s: &RepositorySnapshot) -> Vec<Violation> {
    if s.branches.is_empty() {
        vec![Violation::error(
            &s.name,
            codes::EMPTY_REPOSITORY,
            "appears to be an empty repository",
        )]
    } else {
        Vec::new()
    }
}

/// Rule 2: a canonical Debian packaging branch must exist; legacy aliases
/// are tolerated with a warning.
pub fn master_branch_layout(s: &RepositorySnapshot) -> Vec<Violation> {
    if MASTER_BRANCHES.iter().any(|b| s.branches.contains(*b)) {
        return Vec::new();
    }
    if LEGACY_MASTER_BRANCHES.iter().any(|b| s.branches.contains(*b)) {
        vec![Violation::warning(
            &s.name,
            codes::MASTER_BRANCH_LEGACY,
            "uncommon debian master branch (DEP-14)",
        )
        .with_extra(branch_list(s))]
    } else {
        vec![Violation::error(
            &s.name,
            codes::MASTER_BRANCH_MISSING,
            "no valid Debian master branch",
        )
        .with_extra(branch_list(s))]
    }
}

/// Rule 3: an upstream branch must exist.
pub fn upstream_branch_presence(s: &RepositorySnapshot) -> Vec<Violation> {
    if UPSTREAM_BRANCHES.iter().any(|b| s.branches.contains(*b)) {
        Vec::new()
    } else {
        vec![Violation::error(
            &s.name,
            codes::UPSTREAM_BRANCH_MISSING,
            "no upstream branch",
        )
        .with_extra(branch_list(s))]
    }
}

/// Rule 4: the pristine-tar branch must exist.
pub fn pristine_tar_branch_presence(s: &RepositorySnapshot) -> Vec<Violation> {
    if s.branches.contains(PRISTINE_TAR_BRANCH) {
        Vec::new()
    } else {
        vec![Violation::error(
            &s.name,
            codes::NO_PRISTINE_TAR_BRANCH,
            "no pristine-tar branch",
        )
        .with_extra(branch_list(s))]
    }
}

/// Rule 5: without a debian/ directory no metadata rule can run.
pub fn metadata_directory_presence(s: &RepositorySnapshot) -> Vec<Violation> {
    if s.has_debian_directory {
        Vec::new()
    } else {
        vec![Violation::error(
            &s.name,
            codes::METADATA_DIRECTORY_MISSING,
            "no debian/ directory found",
        )]
    }
}

/// Rule 6: repository name must match the source package name.
pub fn source_name_match(s: &RepositorySnapshot) -> Vec<Violation> {
    match s.control_fields.get("Source") {
        Some(source) if source == &s.name => Vec::new(),
        Some(source) => vec![Violation::error(
            &s.name,
            codes::SOURCE_NAME_MISMATCH,
            format!(
                "repo name \"{}\" does not match the package source name \"{}\"",
                s.name, source
            ),
        )
        .with_extra(format!("repo={} source={}", s.name, source))],
        None => vec![Violation::error(
            &s.name,
            codes::SOURCE_NAME_MISMATCH,
            "debian/control has no Source field",
        )
        .with_extra(format!("repo={} source=<missing>", s.name))],
    }
}

/// Rule 7: Uploaders should be present.
pub fn uploaders_field_presence(s: &RepositorySnapshot) -> Vec<Violation> {
    if s.control_fields.contains_key("Uploaders") {
        Vec::new()
    } else {
        vec![Violation::warning(
            &s.name,
            codes::UPLOADERS_MISSING,
            "debian/control has no Uploaders field",
        )]
    }
}

/// Rule 8: the team must appear in Maintainer or Uploaders, ideally under
/// its canonical identity.
pub fn team_ownership(s: &RepositorySnapshot) -> Vec<Violation> {
    let mut combined = String::new();
    for field in ["Maintainer", "Uploaders"] {
        if let Some(v) = s.control_fields.get(field) {
            combined.push_str(v);
            combined.push('\n');
        }
    }
    if combined.contains(TEAM_CANONICAL) {
        return Vec::new();
    }
    if TEAM_DEPRECATED.iter().any(|id| combined.contains(id)) {
        vec![Violation::warning(
            &s.name,
            codes::TEAM_MAINTAINER_DEPRECATED,
            format!(
                "team listed only under a deprecated identity, use {}",
                TEAM_CANONICAL
            ),
        )]
    } else {
        vec![Violation::error(
            &s.name,
            codes::TEAM_MAINTAINER_MISSING,
            "team is not in Maintainer or Uploaders",
        )]
    }
}

/// Rule 9: Vcs-Browser and Vcs-Git must point at this repository.
pub fn vcs_fields_consistency(s: &RepositorySnapshot) -> Vec<Violation> {
    let mut out = Vec::new();
    match s.control_fields.get("Vcs-Browser") {
        None => out.push(Violation::error(
            &s.name,
            codes::VCS_BROWSER_MISSING,
            "debian/control has no Vcs-Browser field",
        )),
        Some(v) if v != &s.web_url => out.push(
            Violation::error(
                &s.name,
                codes::VCS_BROWSER_MISMATCH,
                format!("Vcs-Browser \"{}\" does not match the repo url \"{}\"", v, s.web_url),
            )
            .with_extra(format!("field={} repo={}", v, s.web_url)),
        ),
        Some(_) => {}
    }
    match s.control_fields.get("Vcs-Git") {
        None => out.push(Violation::error(
            &s.name,
            codes::VCS_GIT_MISSING,
            "debian/control has no Vcs-Git field",
        )),
        Some(v) if v != &s.git_url => out.push(
            Violation::error(
                &s.name,
                codes::VCS_GIT_MISMATCH,
                format!("Vcs-Git \"{}\" does not match the clone url \"{}\"", v, s.git_url),
            )
            .with_extra(format!("field={} repo={}", v, s.git_url)),
        ),
        Some(_) => {}
    }
    out
}

/// Rule 10: debian/watch must exist, parse, and not point at a deprecated
/// tracking host.
pub fn watch_file_policy(s: &RepositorySnapshot) -> Vec<Violation> {
    let text = match &s.watch_file {
        None => {
            return vec![Violation::error(
                &s.name,
                codes::WATCH_FILE_MISSING,
                "no debian/watch file",
            )]
        }
        Some(t) => t,
    };
    // A usable watch file declares its format version and at least one
    // source line besides it.
    let version_re = Regex::new(r"(?m)^\s*version\s*=\s*\d+").unwrap();
    let has_source_line = text
        .lines()
        .map(str::trim)
        .any(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("version"));
    if !version_re.is_match(text) || !has_source_line {
        return vec![Violation::error(
            &s.name,
            codes::WATCH_FILE_UNPARSABLE,
            "debian/watch is not parsable",
        )];
    }
    for host in DEPRECATED_WATCH_HOSTS {
        if text.contains(host) {
            return vec![Violation::warning(
                &s.name,
                codes::WATCH_FILE_DEPRECATED_HOST,
                format!("debian/watch uses deprecated tracking host {}", host),
            )];
        }
    }
    Vec::new()
}

/// Rule 11: gate for the version-aware rules. Emitted when the archive
/// knows no published version for this source package.
pub fn published_version_gate(s: &RepositorySnapshot) -> Violation {
    Violation::warning(
        &s.name,
        codes::PUBLISHED_VERSION_UNRESOLVED,
        "published version unresolved, package may be unpublished",
    )
}

/// Rule 12: the tags for the published version must exist.
pub fn tag_completeness(s: &RepositorySnapshot, published: &Version) -> Vec<Violation> {
    let mut out = Vec::new();
    let debian_tag = format!("debian/{}", published.tag_version());
    if !s.tags.contains(&debian_tag) {
        out.push(
            Violation::error(
                &s.name,
                codes::DEBIAN_TAG_MISSING,
                format!("missing tag {} for the published version", debian_tag),
            )
            .with_extra(debian_tag),
        );
    }
    let upstream_tag = format!("upstream/{}", published.upstream);
    if !s.tags.contains(&upstream_tag) {
        out.push(
            Violation::error(
                &s.name,
                codes::UPSTREAM_TAG_MISSING,
                format!("missing tag {} for the published upstream version", upstream_tag),
            )
            .with_extra(upstream_tag),
        );
    }
    out
}

/// Rule 13: the changelog must contain an entry for the published version.
///
/// Entries that fail to parse are skipped; they cannot match anyway.
pub fn changelog_completeness(s: &RepositorySnapshot, published: &Version) -> Vec<Violation> {
    let found = s
        .changelog_versions
        .iter()
        .filter_map(|v| Version::parse(v).ok())
        .any(|v| &v == published);
    if found {
        Vec::new()
    } else {
        vec![Violation::error(
            &s.name,
            codes::CHANGELOG_VERSION_MISSING,
            format!("changelog has no entry for the published version {}", published),
        )]
    }
}

/// Rule 14: the pristine-tar branch must carry the delta and id files for
/// the published upstream tarball. Only runs when the branch exists.
pub fn pristine_tar_artifact_completeness(
    s: &RepositorySnapshot,
    published: &Version,
) -> Vec<Violation> {
    let source = s
        .control_fields
        .get("Source")
        .map(String::as_str)
        .unwrap_or(&s.name);
    let mut out = Vec::new();
    for (suffix, code) in [
        ("delta", codes::PRISTINE_TAR_DELTA_MISSING),
        ("id", codes::PRISTINE_TAR_ID_MISSING),
    ] {
        let pattern = format!(
            r"^{}_{}\.orig\.tar\.[A-Za-z0-9]+\.{}$",
            regex::escape(source),
            regex::escape(&published.upstream),
            suffix
        );
        let re = Regex::new(&pattern).unwrap();
        if !s.pristine_tar_files.iter().any(|f| re.is_match(f)) {
            let expected = format!("{}_{}.orig.tar.<ext>.{}", source, published.upstream, suffix);
            out.push(
                Violation::error(
                    &s.name,
                    code,
                    format!("pristine-tar branch has no {} file", expected),
                )
                .with_extra(expected),
            );
        }
    }
    out
}

/// Rule 15: notification hooks and integrations. Only runs when hook and
/// integration data was actually collected (it is permission-gated).
pub fn notification_hooks_presence(s: &RepositorySnapshot) -> Vec<Violation> {
    let mut out = Vec::new();
    if let Some(hooks) = &s.hooks {
        if !hooks.iter().any(|h| h.url.starts_with(TAGPENDING_HOOK_PREFIX)) {
            out.push(Violation::warning(
                &s.name,
                codes::TAGPENDING_HOOK_MISSING,
                "tagpending webhook is not configured",
            ));
        }
        if !hooks.iter().any(|h| h.url == KGB_HOOK_URL) {
            out.push(Violation::warning(
                &s.name,
                codes::KGB_HOOK_MISSING,
                "KGB IRC-relay webhook is not configured",
            ));
        }
    }
    if let Some(services) = &s.services {
        if !services.iter().any(|sv| sv.title == EMAILS_ON_PUSH_TITLE) {
            out.push(Violation::warning(
                &s.name,
                codes::EMAILS_ON_PUSH_MISSING,
                "Emails on push integration is not configured",
            ));
        }
        if services.iter().any(|sv| sv.title == IRKER_TITLE) {
            out.push(Violation::warning(
                &s.name,
                codes::IRKER_INTEGRATION_ACTIVE,
                "deprecated Irker integration is still active, migrate to KGB",
            ));
        }
    }
    out
}

/// Rule 16: pyproject.toml packages should build with the PEP 517 helper.
///
/// Detection is substring containment on Build-Depends, not exact token
/// match; this mirrors team practice and is a policy decision.
pub fn build_system_consistency(s: &RepositorySnapshot) -> Vec<Violation> {
    if !s.has_pyproject_toml {
        return Vec::new();
    }
    let has_plugin = s
        .control_fields
        .get("Build-Depends")
        .map(|bd| bd.contains(PEP517_PLUGIN))
        .unwrap_or(false);
    if has_plugin {
        Vec::new()
    } else {
        vec![Violation::warning(
            &s.name,
            codes::PEP517_PLUGIN_MISSING,
            format!("package ships pyproject.toml but Build-Depends lacks {}", PEP517_PLUGIN),
        )]
    }
}
