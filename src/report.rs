//! Text report rendering.
//!
//! `render` is a pure function: identical index, count, and timestamp
//! always produce byte-identical output. Section order and indentation are
//! part of the contract for consumers diffing reports across runs; both
//! sections follow the insertion order of the index, no secondary sort.

use crate::models::violation::ViolationIndex;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Render the final audit report.
pub fn render(index: &ViolationIndex, total_processed: usize, timestamp: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generated at: {}", timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Repositories processed: {}", total_processed);
    let _ = writeln!(
        out,
        "Repositories with violations: {}",
        index.by_repository.len()
    );
    let _ = writeln!(out, "Distinct violation codes: {}", index.by_code.len());
    let _ = writeln!(out, "Total violations: {}", index.total());
    out.push('\n');

    out.push_str("Per repository violations:\n");
    for (repo, violations) in index.by_repository.iter() {
        let _ = writeln!(out, "{} ({})", repo, violations.len());
        for v in violations {
            let _ = writeln!(out, "    {} [{}] {}", v.severity, v.code, v.message);
            if let Some(extra) = &v.extra {
                let _ = writeln!(out, "        {}", extra);
            }
        }
    }
    out.push('\n');

    out.push_str("Per violation repositories:\n");
    for (code, repos) in index.by_code.iter() {
        let _ = writeln!(out, "{} ({})", code, repos.len());
        for repo in repos {
            let _ = writeln!(out, "    {}", repo);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::violation::{codes, Violation};
    use chrono::TimeZone;

    fn sample_index() -> ViolationIndex {
        let mut index = ViolationIndex::default();
        index.record(
            Violation::error("zlib-repo", codes::NO_PRISTINE_TAR_BRANCH, "no pristine-tar branch")
                .with_extra("available branches: [master]"),
        );
        index.record(Violation::warning(
            "alpha-repo",
            codes::UPLOADERS_MISSING,
            "debian/control has no Uploaders field",
        ));
        index.record(Violation::error(
            "zlib-repo",
            codes::WATCH_FILE_MISSING,
            "no debian/watch file",
        ));
        index
    }

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_is_byte_deterministic() {
        let index = sample_index();
        assert_eq!(render(&index, 5, ts()), render(&index, 5, ts()));
    }

    #[test]
    fn test_render_sections_and_insertion_order() {
        let text = render(&sample_index(), 5, ts());
        let expected = "\
Generated at: 2024-05-17 12:00:00 UTC
Repositories processed: 5
Repositories with violations: 2
Distinct violation codes: 3
Total violations: 3

Per repository violations:
zlib-repo (2)
    ERROR [no-pristine-tar-branch] no pristine-tar branch
        available branches: [master]
    ERROR [watch-file-missing] no debian/watch file
alpha-repo (1)
    WARNING [uploaders-missing] debian/control has no Uploaders field

Per violation repositories:
no-pristine-tar-branch (1)
    zlib-repo
uploaders-missing (1)
    alpha-repo
watch-file-missing (1)
    zlib-repo
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty_index() {
        let text = render(&ViolationIndex::default(), 0, ts());
        assert!(text.contains("Repositories processed: 0"));
        assert!(text.contains("Per repository violations:\n\nPer violation repositories:\n"));
    }
}
