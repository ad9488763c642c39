//! Output rendering for the audit command.
//!
//! Supports `human` (default, colored), `json` (stable machine shape with
//! a top-level summary), and `report` (the plain-text report format meant
//! for diffing across runs).

use crate::models::violation::{Severity, ViolationIndex};
use crate::models::Summary;
use crate::report;
use crate::scan::ScanOutcome;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn summary_of(index: &ViolationIndex, processed: usize) -> Summary {
    Summary {
        errors: index.count_severity(Severity::Error),
        warnings: index.count_severity(Severity::Warning),
        repositories: processed,
        flagged: index.by_repository.len(),
    }
}

/// Print audit results in the requested format.
pub fn print_audit(outcome: &ScanOutcome, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_audit_json(&outcome.index, outcome.processed))
                .unwrap()
        ),
        "report" => print!(
            "{}",
            report::render(&outcome.index, outcome.processed, outcome.finished_at)
        ),
        _ => {
            let color = use_colors(output);
            for (repo, violations) in outcome.index.by_repository.iter() {
                let name = if color {
                    repo.bold().to_string()
                } else {
                    repo.to_string()
                };
                println!("{}", name);
                for v in violations {
                    let sev = match v.severity {
                        Severity::Error => {
                            if color {
                                "ERROR".red().bold().to_string()
                            } else {
                                "ERROR".to_string()
                            }
                        }
                        Severity::Warning => {
                            if color {
                                "WARNING".yellow().bold().to_string()
                            } else {
                                "WARNING".to_string()
                            }
                        }
                    };
                    println!("    {} [{}] {}", sev, v.code, v.message);
                }
            }
            let s = summary_of(&outcome.index, outcome.processed);
            let summary = format!(
                "— Summary — errors={} warnings={} repositories={} flagged={}",
                s.errors, s.warnings, s.repositories, s.flagged
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Compose the audit JSON object (pure) for testing/snapshot purposes.
pub fn compose_audit_json(index: &ViolationIndex, processed: usize) -> JsonVal {
    let repositories: Vec<JsonVal> = index
        .by_repository
        .iter()
        .map(|(repo, violations)| {
            json!({
                "repository": repo,
                "violations": violations,
            })
        })
        .collect();
    let by_code: Vec<JsonVal> = index
        .by_code
        .iter()
        .map(|(code, repos)| json!({"code": code, "repositories": repos}))
        .collect();
    let summary = summary_of(index, processed);
    json!({
        "repositories": repositories,
        "by_code": by_code,
        "summary": summary,
    })
}
