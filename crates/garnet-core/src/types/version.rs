//! Gem version numbers.
//!
//! A [`GemVersion`] is a dotted sequence of numeric and alphabetic segments.
//! Any alphabetic segment marks the version as a prerelease, and prereleases
//! sort before the release they precede (`1.0.a < 1.0`).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// One segment of a version number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    // Declared first so that text segments sort below numbers.
    Text(String),
    Number(u64),
}

/// Version number with rubygems ordering rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GemVersion {
    raw: String,
    segments: Vec<Segment>,
    canonical: Vec<Segment>,
}

/// Version parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed version number string {input}")]
    InvalidFormat { input: String },

    #[error("Version segment out of range in {input}")]
    SegmentOverflow { input: String },
}

impl GemVersion {
    /// The `0` version
    pub fn zero() -> Self {
        Self::from_segments(vec![Segment::Number(0)])
    }

    fn from_segments(segments: Vec<Segment>) -> Self {
        let raw = segments
            .iter()
            .map(|segment| match segment {
                Segment::Number(n) => n.to_string(),
                Segment::Text(s) => s.clone(),
            })
            .collect::<Vec<_>>()
            .join(".");
        let canonical = canonicalize(&segments);
        Self {
            raw,
            segments,
            canonical,
        }
    }

    /// All segments as written (after `-` expansion)
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Text(_)))
    }

    /// The version with every segment from the first text segment on removed
    pub fn release(&self) -> Self {
        if !self.is_prerelease() {
            return self.clone();
        }
        let numeric = self
            .segments
            .iter()
            .take_while(|segment| matches!(segment, Segment::Number(_)))
            .cloned()
            .collect::<Vec<_>>();
        Self::from_segments(numeric)
    }

    /// Next significant release: `1.2.3 -> 1.3`, `1.2 -> 2`, `1 -> 2`.
    pub fn bump(&self) -> Self {
        let mut segments = self.segments.clone();
        while segments
            .iter()
            .any(|segment| matches!(segment, Segment::Text(_)))
        {
            segments.pop();
        }
        if segments.len() > 1 {
            segments.pop();
        }
        match segments.last_mut() {
            Some(Segment::Number(n)) => *n = n.saturating_add(1),
            _ => segments = vec![Segment::Number(1)],
        }
        Self::from_segments(segments)
    }

    /// Exclusive upper bound of `~> self`: the bump followed by the lowest
    /// prerelease marker, so prereleases of the bump stay out of range.
    pub fn pessimistic_upper_bound(&self) -> Self {
        let mut segments = self.bump().segments;
        segments.push(Segment::Text("A".to_string()));
        Self::from_segments(segments)
    }

    /// Leading numeric segment at `index`, 0 when absent
    pub fn numeric_segment(&self, index: usize) -> u64 {
        match self.segments.get(index) {
            Some(Segment::Number(n)) => *n,
            _ => 0,
        }
    }
}

/// Strip trailing zeros from the release part and from the prerelease part.
fn canonicalize(segments: &[Segment]) -> Vec<Segment> {
    let split = segments
        .iter()
        .position(|segment| matches!(segment, Segment::Text(_)))
        .unwrap_or(segments.len());
    let (release, prerelease) = segments.split_at(split);

    let mut canonical = trim_zeros(release);
    canonical.extend(trim_zeros(prerelease));
    canonical
}

fn trim_zeros(segments: &[Segment]) -> Vec<Segment> {
    let end = segments
        .iter()
        .rposition(|segment| *segment != Segment::Number(0))
        .map_or(0, |index| index + 1);
    segments[..end].to_vec()
}

fn valid_part(part: &str, allow_dash: bool) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || (allow_dash && c == '-'))
}

impl FromStr for GemVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Ok(Self::zero());
        }

        let invalid = || VersionError::InvalidFormat {
            input: s.to_string(),
        };

        let (main, prerelease) = match input.split_once('-') {
            Some((main, pre)) => (main, Some(pre)),
            None => (input, None),
        };

        let mut parts = main.split('.');
        let first = parts.next().ok_or_else(invalid)?;
        if first.is_empty() || !first.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !parts.all(|part| valid_part(part, false)) {
            return Err(invalid());
        }
        if let Some(pre) = prerelease {
            if !pre.split('.').all(|part| valid_part(part, true)) {
                return Err(invalid());
            }
        }

        let expanded = input.replace('-', ".pre.");
        let mut segments = Vec::new();
        let mut current = String::new();
        for c in expanded.chars() {
            let boundary = match current.chars().last() {
                Some(last) => c == '.' || last.is_ascii_digit() != c.is_ascii_digit(),
                None => false,
            };
            if boundary {
                segments.push(to_segment(&current, s)?);
                current.clear();
            }
            if c != '.' {
                current.push(c);
            }
        }
        if !current.is_empty() {
            segments.push(to_segment(&current, s)?);
        }

        let canonical = canonicalize(&segments);
        Ok(Self {
            raw: input.to_string(),
            segments,
            canonical,
        })
    }
}

fn to_segment(run: &str, input: &str) -> Result<Segment, VersionError> {
    if run.chars().all(|c| c.is_ascii_digit()) {
        run.parse()
            .map(Segment::Number)
            .map_err(|_| VersionError::SegmentOverflow {
                input: input.to_string(),
            })
    } else {
        Ok(Segment::Text(run.to_string()))
    }
}

impl TryFrom<String> for GemVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GemVersion> for String {
    fn from(version: GemVersion) -> Self {
        version.raw
    }
}

impl Ord for GemVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.canonical.len().max(other.canonical.len());
        let zero = Segment::Number(0);
        for index in 0..len {
            let left = self.canonical.get(index).unwrap_or(&zero);
            let right = other.canonical.get(index).unwrap_or(&zero);
            match left.cmp(right) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for GemVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GemVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GemVersion {}

impl Hash for GemVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for GemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn version_strategy() -> impl Strategy<Value = GemVersion> {
        (
            prop::collection::vec(0u64..20, 1..4),
            prop::option::of(prop_oneof![Just("a"), Just("beta"), Just("rc")]),
        )
            .prop_map(|(numbers, pre)| {
                let mut text = numbers
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                if let Some(pre) = pre {
                    text.push('.');
                    text.push_str(pre);
                }
                text.parse().unwrap()
            })
    }

    proptest! {
        #[test]
        fn test_display_parse_round_trip(version in version_strategy()) {
            let reparsed: GemVersion = version.to_string().parse().unwrap();
            prop_assert_eq!(reparsed, version);
        }

        #[test]
        fn test_ordering_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }

        #[test]
        fn test_release_never_prerelease(version in version_strategy()) {
            prop_assert!(!version.release().is_prerelease());
            prop_assert!(version <= version.release());
        }

        #[test]
        fn test_bump_is_greater(version in version_strategy()) {
            prop_assert!(version.bump() > version);
        }
    }
}
