//! Debian package version parsing and ordering.
//!
//! Implements the `epoch:upstream_version-debian_revision` scheme and the
//! comparison algorithm used by the archive: versions are walked as
//! alternating non-digit and digit runs, `~` sorts before everything
//! (including end of string), letters sort before other non-digit
//! characters, and digit runs compare as unbounded numbers.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Parse failure for a version string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedVersion {
    #[error("empty version string")]
    Empty,
    #[error("epoch is not a number in '{0}'")]
    BadEpoch(String),
    #[error("empty upstream version in '{0}'")]
    EmptyUpstream(String),
    #[error("empty revision in '{0}'")]
    EmptyRevision(String),
    #[error("illegal character '{ch}' in {segment} of '{text}'")]
    IllegalChar {
        ch: char,
        segment: &'static str,
        text: String,
    },
}

/// A parsed Debian version. Missing epoch compares equal to epoch 0.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: Option<u32>,
    pub upstream: String,
    pub revision: Option<String>,
}

impl Version {
    /// Parse `text` into a `Version`.
    ///
    /// Splits on the first `:` for the epoch and the last `-` for the
    /// revision, then validates each segment's character set. Fails closed:
    /// anything out of place is a `MalformedVersion`, never a silently
    /// misordered value.
    pub fn parse(text: &str) -> Result<Version, MalformedVersion> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MalformedVersion::Empty);
        }
        let (epoch, rest) = match text.split_once(':') {
            Some((e, rest)) => {
                let epoch: u32 = e
                    .parse()
                    .map_err(|_| MalformedVersion::BadEpoch(text.to_string()))?;
                (Some(epoch), rest)
            }
            None => (None, text),
        };
        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((u, r)) => (u, Some(r)),
            None => (rest, None),
        };
        if upstream.is_empty() {
            return Err(MalformedVersion::EmptyUpstream(text.to_string()));
        }
        for ch in upstream.chars() {
            let ok = ch.is_ascii_alphanumeric()
                || matches!(ch, '.' | '+' | '~')
                || (ch == '-' && revision.is_some())
                || (ch == ':' && epoch.is_some());
            if !ok {
                return Err(MalformedVersion::IllegalChar {
                    ch,
                    segment: "upstream version",
                    text: text.to_string(),
                });
            }
        }
        if let Some(rev) = revision {
            if rev.is_empty() {
                return Err(MalformedVersion::EmptyRevision(text.to_string()));
            }
            for ch in rev.chars() {
                if !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '+' | '~')) {
                    return Err(MalformedVersion::IllegalChar {
                        ch,
                        segment: "revision",
                        text: text.to_string(),
                    });
                }
            }
        }
        Ok(Version {
            epoch,
            upstream: upstream.to_string(),
            revision: revision.map(|r| r.to_string()),
        })
    }

    /// The full version without the epoch, as used in `debian/<v>` tags.
    pub fn tag_version(&self) -> String {
        match &self.revision {
            Some(rev) => format!("{}-{}", self.upstream, rev),
            None => self.upstream.clone(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(e) = self.epoch {
            write!(f, "{}:", e)?;
        }
        f.write_str(&self.upstream)?;
        if let Some(rev) = &self.revision {
            write!(f, "-{}", rev)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let ea = self.epoch.unwrap_or(0);
        let eb = other.epoch.unwrap_or(0);
        ea.cmp(&eb)
            .then_with(|| verrevcmp(&self.upstream, &other.upstream))
            .then_with(|| {
                verrevcmp(
                    self.revision.as_deref().unwrap_or(""),
                    other.revision.as_deref().unwrap_or(""),
                )
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Sort weight of a single byte within a non-digit run.
///
/// `~` before end-of-string (0), letters by their ASCII value, everything
/// else shifted past the letters.
fn order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

/// Compare two upstream-version or revision segments.
fn verrevcmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        // non-digit run, character by character
        while i < a.len() && !a[i].is_ascii_digit() || j < b.len() && !b[j].is_ascii_digit() {
            let oa = order(a.get(i).copied());
            let ob = order(b.get(j).copied());
            if oa != ob {
                return oa.cmp(&ob);
            }
            i += 1;
            j += 1;
        }
        // digit run, numeric with insignificant leading zeros
        while i < a.len() && a[i] == b'0' {
            i += 1;
        }
        while j < b.len() && b[j] == b'0' {
            j += 1;
        }
        let mut first_diff = Ordering::Equal;
        while i < a.len() && a[i].is_ascii_digit() && j < b.len() && b[j].is_ascii_digit() {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if i < a.len() && a[i].is_ascii_digit() {
            return Ordering::Greater;
        }
        if j < b.len() && b[j].is_ascii_digit() {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_three_parts() {
        let ver = v("1:2.0.3-4really2");
        assert_eq!(ver.epoch, Some(1));
        assert_eq!(ver.upstream, "2.0.3");
        assert_eq!(ver.revision.as_deref(), Some("4really2"));
        assert_eq!(ver.to_string(), "1:2.0.3-4really2");
    }

    #[test]
    fn test_parse_revision_splits_on_last_dash() {
        let ver = v("1.0-2-1");
        assert_eq!(ver.upstream, "1.0-2");
        assert_eq!(ver.revision.as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_epoch_is_zero() {
        assert_eq!(v("1.0-1"), v("0:1.0-1"));
    }

    #[test]
    fn test_tilde_sorts_before_everything() {
        assert!(v("1.0~beta1") < v("1.0"));
        assert!(v("1.0~~") < v("1.0~"));
        assert!(v("1.0~rc1") < v("1.0~rc1+b1"));
    }

    #[test]
    fn test_digit_runs_compare_numerically() {
        assert!(v("1.2.10-1") > v("1.2.9-1"));
        assert!(v("1.09") == v("1.9"));
        assert!(v("2.0") < v("10.0"));
    }

    #[test]
    fn test_letters_before_other_nondigits() {
        assert!(v("1.0a") < v("1.0+"));
        assert!(v("1.0") < v("1.0a"));
    }

    #[test]
    fn test_epoch_dominates() {
        assert!(v("1:0.1") > v("999.9-9"));
    }

    #[test]
    fn test_missing_revision_sorts_before_any() {
        assert!(v("1.0") < v("1.0-1"));
    }

    #[test]
    fn test_antisymmetry_and_transitivity_spot_checks() {
        let samples = [
            "1.0~beta1",
            "1.0",
            "1.0-1",
            "1.0-1+deb12u1",
            "1.0.1",
            "1.2.9-1",
            "1.2.10-1",
            "1:0.5",
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(v(a).cmp(&v(b)), v(b).cmp(&v(a)).reverse());
                for c in &samples {
                    if v(a) <= v(b) && v(b) <= v(c) {
                        assert!(v(a) <= v(c), "{} <= {} <= {}", a, b, c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_malformed_inputs_fail_closed() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("abc:1.0").is_err());
        assert!(Version::parse("1.0 beta").is_err());
        assert!(Version::parse("1:").is_err());
        assert!(Version::parse("1.0-").is_err());
        assert!(Version::parse("1.0-1_2").is_err());
    }

    #[test]
    fn test_tag_version_omits_epoch() {
        assert_eq!(v("1:3.5.0-1").tag_version(), "3.5.0-1");
        assert_eq!(v("3.5.0").tag_version(), "3.5.0");
    }
}
