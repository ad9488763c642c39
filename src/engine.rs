//! Policy engine: runs the rule catalogue against one snapshot.
//!
//! Execution order is fixed so identical inputs always produce identically
//! ordered violations. Short circuits:
//! - an empty repository stops everything after rule 1;
//! - a missing debian/ directory is terminal: the branch rules above it
//!   have already run, everything after it is skipped;
//! - an unresolved published version skips only the version-aware rules
//!   (tags, changelog, pristine-tar artifacts).
//!
//! A fault inside a rule (panic or a version string the engine could not
//! have validated up front) is isolated into one `internal-check-failure`
//! violation naming the rule; the remaining independent rules still run.

use crate::models::snapshot::{ExternalFacts, RepositorySnapshot};
use crate::models::violation::{codes, Violation};
use crate::rules;
use crate::version::Version;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Build the violation reported when a rule itself failed.
pub fn internal_failure(repository: &str, rule: &str, detail: &str) -> Violation {
    Violation::error(
        repository,
        codes::INTERNAL_CHECK_FAILURE,
        format!("check '{}' failed: {}", rule, detail),
    )
    .with_extra(rule.to_string())
}

/// Run one rule under the engine boundary, appending its findings or a
/// single `internal-check-failure` on fault.
fn guard<F>(out: &mut Vec<Violation>, repository: &str, rule: &str, f: F)
where
    F: FnOnce() -> Vec<Violation>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(mut found) => out.append(&mut found),
        Err(panic) => {
            let detail = panic
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| panic.downcast_ref::<&str>().copied())
                .unwrap_or("panicked");
            out.push(internal_failure(repository, rule, detail));
        }
    }
}

/// Execute the full catalogue against one repository snapshot.
///
/// Never fails: policy findings, malformed collaborator data, and rule
/// faults all come back as violations, so one bad repository cannot abort
/// the scan.
pub fn run(s: &RepositorySnapshot, facts: &ExternalFacts) -> Vec<Violation> {
    let mut out = Vec::new();

    guard(&mut out, &s.name, "empty-repository", || {
        rules::empty_repository(s)
    });
    if s.branches.is_empty() {
        return out;
    }

    guard(&mut out, &s.name, "master-branch-layout", || {
        rules::master_branch_layout(s)
    });
    guard(&mut out, &s.name, "upstream-branch-presence", || {
        rules::upstream_branch_presence(s)
    });
    guard(&mut out, &s.name, "pristine-tar-branch-presence", || {
        rules::pristine_tar_branch_presence(s)
    });

    guard(&mut out, &s.name, "metadata-directory-presence", || {
        rules::metadata_directory_presence(s)
    });
    if !s.has_debian_directory {
        return out;
    }

    guard(&mut out, &s.name, "source-name-match", || {
        rules::source_name_match(s)
    });
    guard(&mut out, &s.name, "uploaders-field-presence", || {
        rules::uploaders_field_presence(s)
    });
    guard(&mut out, &s.name, "team-ownership", || {
        rules::team_ownership(s)
    });
    guard(&mut out, &s.name, "vcs-fields-consistency", || {
        rules::vcs_fields_consistency(s)
    });
    guard(&mut out, &s.name, "watch-file-policy", || {
        rules::watch_file_policy(s)
    });

    match &facts.published_version {
        None => out.push(rules::published_version_gate(s)),
        Some(raw) => match Version::parse(raw) {
            Err(err) => out.push(internal_failure(
                &s.name,
                "published-version-gate",
                &err.to_string(),
            )),
            Ok(published) => {
                guard(&mut out, &s.name, "tag-completeness", || {
                    rules::tag_completeness(s, &published)
                });
                guard(&mut out, &s.name, "changelog-completeness", || {
                    rules::changelog_completeness(s, &published)
                });
                if s.branches.contains(rules::PRISTINE_TAR_BRANCH) {
                    guard(&mut out, &s.name, "pristine-tar-artifact-completeness", || {
                        rules::pristine_tar_artifact_completeness(s, &published)
                    });
                }
            }
        },
    }

    guard(&mut out, &s.name, "notification-hooks-presence", || {
        rules::notification_hooks_presence(s)
    });
    guard(&mut out, &s.name, "build-system-consistency", || {
        rules::build_system_consistency(s)
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot::Hook;
    use crate::models::violation::Severity;

    fn compliant_snapshot() -> RepositorySnapshot {
        let mut s = RepositorySnapshot::bare("good-pkg");
        s.web_url = "https://salsa.debian.org/python-team/packages/good-pkg".into();
        s.git_url = "https://salsa.debian.org/python-team/packages/good-pkg.git".into();
        s.default_branch = "debian/master".into();
        for b in ["debian/master", "upstream", "pristine-tar"] {
            s.branches.insert(b.into());
        }
        s.tags.insert("debian/1.2.3-1".into());
        s.tags.insert("upstream/1.2.3".into());
        s.has_debian_directory = true;
        s.control_fields.insert("Source".into(), "good-pkg".into());
        s.control_fields.insert(
            "Maintainer".into(),
            format!("Debian Python Team <{}>", rules::TEAM_CANONICAL),
        );
        s.control_fields
            .insert("Uploaders".into(), "Jane Doe <jd@debian.org>".into());
        s.control_fields
            .insert("Vcs-Browser".into(), s.web_url.clone());
        s.control_fields.insert("Vcs-Git".into(), s.git_url.clone());
        s.watch_file = Some(
            "version=4\nhttps://github.com/x/good-pkg/tags .*/v?(\\d\\S+)\\.tar\\.gz\n".into(),
        );
        s.changelog_versions = vec!["1.2.3-1".into(), "1.2.2-1".into()];
        s.pristine_tar_files
            .insert("good-pkg_1.2.3.orig.tar.gz.delta".into());
        s.pristine_tar_files
            .insert("good-pkg_1.2.3.orig.tar.gz.id".into());
        s
    }

    fn facts(v: &str) -> ExternalFacts {
        ExternalFacts {
            published_version: Some(v.to_string()),
        }
    }

    #[test]
    fn test_compliant_repository_is_clean() {
        let out = run(&compliant_snapshot(), &facts("1.2.3-1"));
        assert!(out.is_empty(), "unexpected violations: {:?}", out);
    }

    #[test]
    fn test_empty_repository_short_circuits() {
        let s = RepositorySnapshot::bare("empty");
        let out = run(&s, &ExternalFacts::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].code, codes::EMPTY_REPOSITORY);
    }

    #[test]
    fn test_missing_debian_directory_stops_metadata_rules() {
        let mut s = compliant_snapshot();
        s.has_debian_directory = false;
        let out = run(&s, &facts("1.2.3-1"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].code, codes::METADATA_DIRECTORY_MISSING);
        assert_eq!(out[0].severity, Severity::Error);
    }

    #[test]
    fn test_branch_rules_still_run_without_debian_directory() {
        let mut s = compliant_snapshot();
        s.has_debian_directory = false;
        s.branches.remove("pristine-tar");
        let codes_seen: Vec<&str> = run(&s, &facts("1.2.3-1")).iter().map(|v| v.code).collect();
        assert_eq!(
            codes_seen,
            vec![codes::NO_PRISTINE_TAR_BRANCH, codes::METADATA_DIRECTORY_MISSING]
        );
    }

    #[test]
    fn test_unresolved_published_version_skips_only_version_rules() {
        let mut s = compliant_snapshot();
        s.tags.clear(); // would trip tag completeness if it ran
        s.hooks = Some(vec![Hook { url: "https://example.org/other".into() }]);
        let codes_seen: Vec<&str> = run(&s, &ExternalFacts::default())
            .iter()
            .map(|v| v.code)
            .collect();
        assert_eq!(
            codes_seen,
            vec![
                codes::PUBLISHED_VERSION_UNRESOLVED,
                codes::TAGPENDING_HOOK_MISSING,
                codes::KGB_HOOK_MISSING,
            ]
        );
    }

    #[test]
    fn test_malformed_published_version_is_isolated() {
        let s = compliant_snapshot();
        let out = run(&s, &facts("not a version!"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].code, codes::INTERNAL_CHECK_FAILURE);
        assert_eq!(out[0].extra.as_deref(), Some("published-version-gate"));
    }

    #[test]
    fn test_violations_follow_catalogue_order() {
        let mut s = compliant_snapshot();
        s.branches.remove("upstream");
        s.control_fields.remove("Uploaders");
        s.watch_file = None;
        let codes_seen: Vec<&str> = run(&s, &facts("1.2.3-1")).iter().map(|v| v.code).collect();
        assert_eq!(
            codes_seen,
            vec![
                codes::UPSTREAM_BRANCH_MISSING,
                codes::UPLOADERS_MISSING,
                codes::WATCH_FILE_MISSING,
            ]
        );
    }
}
