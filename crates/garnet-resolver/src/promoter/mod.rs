//! Version preference
//!
//! The solver tries candidates in preference order. A [`PreferencePolicy`]
//! decides that order; [`VersionPromoter`] is the default one.

use crate::package::{Package, PackagePolicy};
use crate::version::Version;
use garnet_config::{ResolverSettings, UpdateLevel};
use garnet_core::types::GemVersion;

/// Orders candidate versions of a package
pub trait PreferencePolicy {
    /// Reorder `versions` from least to most preferred.
    ///
    /// Must return a permutation of its input: nothing added, nothing dropped.
    fn sort_versions(
        &self,
        package: &Package,
        policy: &PackagePolicy,
        versions: Vec<Version>,
    ) -> Vec<Version>;
}

/// Prefers the newest release allowed by the update level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionPromoter {
    level: UpdateLevel,
    pre: bool,
}

impl VersionPromoter {
    pub fn new(level: UpdateLevel, pre: bool) -> Self {
        Self { level, pre }
    }

    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self::new(settings.update_level, settings.prerelease)
    }

    pub fn level(&self) -> UpdateLevel {
        self.level
    }

    /// Whether `candidate` stays inside the update window around `locked`
    fn within_level(&self, locked: &GemVersion, candidate: &GemVersion) -> bool {
        if candidate < locked {
            return false;
        }
        let same = |index| locked.numeric_segment(index) == candidate.numeric_segment(index);
        match self.level {
            UpdateLevel::Major => true,
            UpdateLevel::Minor => same(0),
            UpdateLevel::Patch => same(0) && same(1),
        }
    }

    /// 0 = disfavored prerelease, 1 = outside the update window, 2 = preferred
    fn rank(&self, policy: &PackagePolicy, version: &Version) -> u8 {
        if version.is_prerelease() && !(self.pre || policy.prerelease_specified) {
            return 0;
        }
        match &policy.locked_version {
            Some(locked) if policy.unlock && !self.within_level(locked, version.gem_version()) => 1,
            _ => 2,
        }
    }
}

impl PreferencePolicy for VersionPromoter {
    fn sort_versions(
        &self,
        _package: &Package,
        policy: &PackagePolicy,
        mut versions: Vec<Version>,
    ) -> Vec<Version> {
        versions.sort();
        versions.sort_by_key(|version| self.rank(policy, version));

        if let (Some(locked), false) = (&policy.locked_version, policy.unlock) {
            let (held, mut rest): (Vec<Version>, Vec<Version>) = versions
                .into_iter()
                .partition(|version| version.gem_version() == locked);
            rest.extend(held);
            versions = rest;
        }
        versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garnet_core::types::Artifact;

    fn version(s: &str) -> Version {
        Version::new(s.parse().unwrap(), vec![Artifact::new("a", s.parse().unwrap())])
    }

    fn sorted(promoter: VersionPromoter, policy: &PackagePolicy, input: &[&str]) -> Vec<String> {
        let versions = input.iter().map(|s| version(s)).collect();
        promoter
            .sort_versions(&Package::new("a"), policy, versions)
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn test_default_prefers_newest() {
        let order = sorted(
            VersionPromoter::default(),
            &PackagePolicy::default(),
            &["2.0", "1.0", "1.5"],
        );
        assert_eq!(order, vec!["1.0", "1.5", "2.0"]);
    }

    #[test]
    fn test_prereleases_least_preferred() {
        let input = ["1.0", "2.0.rc1", "1.5"];
        let order = sorted(VersionPromoter::default(), &PackagePolicy::default(), &input);
        assert_eq!(order, vec!["2.0.rc1", "1.0", "1.5"]);

        let requested = PackagePolicy {
            prerelease_specified: true,
            ..Default::default()
        };
        let order = sorted(VersionPromoter::default(), &requested, &input);
        assert_eq!(order, vec!["1.0", "1.5", "2.0.rc1"]);

        let order = sorted(
            VersionPromoter::new(UpdateLevel::Major, true),
            &PackagePolicy::default(),
            &input,
        );
        assert_eq!(order.last().unwrap(), "2.0.rc1");
    }

    #[test]
    fn test_locked_version_most_preferred() {
        let policy = PackagePolicy {
            locked_version: Some("1.5".parse().unwrap()),
            ..Default::default()
        };
        let order = sorted(VersionPromoter::default(), &policy, &["1.0", "1.5", "2.0"]);
        assert_eq!(order, vec!["1.0", "2.0", "1.5"]);
    }

    #[test]
    fn test_minor_level_stays_within_major() {
        let policy = PackagePolicy {
            locked_version: Some("1.2".parse().unwrap()),
            unlock: true,
            ..Default::default()
        };
        let input = ["1.2", "1.4", "2.0", "1.0"];
        let order = sorted(VersionPromoter::new(UpdateLevel::Minor, false), &policy, &input);
        assert_eq!(order, vec!["1.0", "2.0", "1.2", "1.4"]);

        let order = sorted(VersionPromoter::new(UpdateLevel::Major, false), &policy, &input);
        assert_eq!(order.last().unwrap(), "2.0");
    }

    #[test]
    fn test_patch_level() {
        let policy = PackagePolicy {
            locked_version: Some("1.2.0".parse().unwrap()),
            unlock: true,
            ..Default::default()
        };
        let order = sorted(
            VersionPromoter::new(UpdateLevel::Patch, false),
            &policy,
            &["1.2.0", "1.2.5", "1.3.0", "2.0.0"],
        );
        assert_eq!(order, vec!["1.3.0", "2.0.0", "1.2.0", "1.2.5"]);
    }

    #[test]
    fn test_sort_is_a_permutation() {
        let policy = PackagePolicy {
            locked_version: Some("1.1".parse().unwrap()),
            ..Default::default()
        };
        let input = ["1.0", "1.1", "1.2.beta", "3.0", "0.1"];
        let mut order = sorted(VersionPromoter::new(UpdateLevel::Patch, false), &policy, &input);
        order.sort();
        let mut expected: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(order, expected);
    }
}
