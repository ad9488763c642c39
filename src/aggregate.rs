//! Violation aggregation across concurrent policy runs.
//!
//! One mutex guards both index views, so a reader never observes a
//! half-applied add and the by-repository and by-code views always agree
//! on the set of recorded violations.

use crate::models::violation::{Violation, ViolationIndex};
use std::sync::Mutex;

/// Collects violations from many engine runs into a [`ViolationIndex`].
#[derive(Default)]
pub struct ViolationAggregator {
    inner: Mutex<ViolationIndex>,
}

impl ViolationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one violation in both views. O(1) amortized.
    pub fn add(&self, violation: Violation) {
        let mut index = self.inner.lock().expect("aggregator lock poisoned");
        index.record(violation);
    }

    /// A consistent owned view of everything added so far. Safe to call
    /// while other writers keep adding, e.g. for progress reporting.
    pub fn snapshot(&self) -> ViolationIndex {
        self.inner.lock().expect("aggregator lock poisoned").clone()
    }

    /// Consume the aggregator and return the final index.
    pub fn into_index(self) -> ViolationIndex {
        self.inner.into_inner().expect("aggregator lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::violation::codes;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn sample_violations() -> Vec<Violation> {
        let mut out = Vec::new();
        for (repo, code) in [
            ("alpha", codes::EMPTY_REPOSITORY),
            ("beta", codes::UPLOADERS_MISSING),
            ("alpha", codes::WATCH_FILE_MISSING),
            ("gamma", codes::UPLOADERS_MISSING),
            ("beta", codes::NO_PRISTINE_TAR_BRANCH),
            ("gamma", codes::NO_PRISTINE_TAR_BRANCH),
            ("delta", codes::SOURCE_NAME_MISMATCH),
            ("alpha", codes::UPLOADERS_MISSING),
            ("delta", codes::WATCH_FILE_MISSING),
            ("beta", codes::WATCH_FILE_MISSING),
        ] {
            out.push(Violation::error(repo, code, "x"));
        }
        out
    }

    /// Multiset of (repo, code) pairs, ignoring ordering.
    fn contents(index: &ViolationIndex) -> BTreeMap<(String, String), usize> {
        let mut m = BTreeMap::new();
        for (repo, vs) in index.by_repository.iter() {
            for v in vs {
                *m.entry((repo.to_string(), v.code.to_string())).or_insert(0) += 1;
            }
        }
        m
    }

    fn code_contents(index: &ViolationIndex) -> BTreeMap<(String, String), usize> {
        let mut m = BTreeMap::new();
        for (code, repos) in index.by_code.iter() {
            for repo in repos {
                *m.entry((repo.clone(), code.to_string())).or_insert(0) += 1;
            }
        }
        m
    }

    #[test]
    fn test_single_writer_preserves_insertion_order() {
        let agg = ViolationAggregator::new();
        for v in sample_violations() {
            agg.add(v);
        }
        let index = agg.into_index();
        assert_eq!(index.total(), 10);
        let repos: Vec<&str> = index.by_repository.iter().map(|(r, _)| r).collect();
        assert_eq!(repos, vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn test_concurrent_writers_lose_and_duplicate_nothing() {
        let violations = sample_violations();

        // interleaving A: two writers, odd/even split
        let agg_a = Arc::new(ViolationAggregator::new());
        std::thread::scope(|scope| {
            for parity in 0..2usize {
                let agg = Arc::clone(&agg_a);
                let batch: Vec<Violation> = violations
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| i % 2 == parity)
                    .map(|(_, v)| v.clone())
                    .collect();
                scope.spawn(move || {
                    for v in batch {
                        agg.add(v);
                    }
                });
            }
        });

        // interleaving B: single writer, reversed order
        let agg_b = ViolationAggregator::new();
        for v in violations.iter().rev().cloned() {
            agg_b.add(v);
        }

        let a = agg_a.snapshot();
        let b = agg_b.into_index();
        assert_eq!(a.total(), b.total());
        assert_eq!(contents(&a), contents(&b));
        assert_eq!(code_contents(&a), code_contents(&b));
        // both views of the same aggregator agree with each other
        assert_eq!(contents(&a), code_contents(&a));
    }

    #[test]
    fn test_snapshot_while_writing_is_consistent() {
        let agg = ViolationAggregator::new();
        agg.add(Violation::error("r", codes::EMPTY_REPOSITORY, "x"));
        let mid = agg.snapshot();
        agg.add(Violation::error("r", codes::WATCH_FILE_MISSING, "y"));
        assert_eq!(mid.total(), 1);
        assert_eq!(contents(&mid), code_contents(&mid));
        assert_eq!(agg.snapshot().total(), 2);
    }
}
