//! Solver versions
//!
//! A [`Version`] is what the solver picks for a package: a numeric
//! [`GemVersion`] plus the group of artifacts that realize it. The same
//! numeric version can appear twice, once for the platform-independent
//! artifacts and once for a platform-specific group.
//!
//! Range endpoints are artifact-less versions placed at either end of a
//! number, so for any `v`:
//!
//! `lower_bound(v) < ruby-only v < platform v < upper_bound(v)`

use garnet_core::types::{Artifact, Dependency, GemVersion, Platform};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Platform-aware solver version
#[derive(Debug, Clone)]
pub struct Version {
    gem_version: GemVersion,
    spec_group: Arc<[Artifact]>,
    platforms: Arc<[Platform]>,
    position: Position,
}

/// Place of a version among the values sharing its number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Position {
    Lower,
    RubyOnly,
    Platform,
    Upper,
}

impl Version {
    /// Version realized by `specs`, which must all share `gem_version`
    pub fn new(gem_version: GemVersion, specs: Vec<Artifact>) -> Self {
        let mut platforms: Vec<Platform> = specs.iter().map(|spec| spec.platform.clone()).collect();
        platforms.sort_by_key(|platform| platform.to_string());
        platforms.dedup();
        let position = if platforms.len() == 1 && platforms[0].is_ruby() {
            Position::RubyOnly
        } else {
            Position::Platform
        };
        Self {
            gem_version,
            spec_group: specs.into(),
            platforms: platforms.into(),
            position,
        }
    }

    /// Endpoint below every candidate of `gem_version`. Also the root version.
    pub fn lower_bound(gem_version: GemVersion) -> Self {
        Self::endpoint(gem_version, Position::Lower)
    }

    /// Endpoint above every candidate of `gem_version`
    pub fn upper_bound(gem_version: GemVersion) -> Self {
        Self::endpoint(gem_version, Position::Upper)
    }

    fn endpoint(gem_version: GemVersion, position: Position) -> Self {
        Self {
            gem_version,
            spec_group: Arc::from(Vec::new()),
            platforms: Arc::from(Vec::new()),
            position,
        }
    }

    pub fn gem_version(&self) -> &GemVersion {
        &self.gem_version
    }

    pub fn spec_group(&self) -> &[Artifact] {
        &self.spec_group
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn is_ruby_only(&self) -> bool {
        self.position == Position::RubyOnly
    }

    /// Whether this is a range endpoint rather than a candidate
    pub fn is_endpoint(&self) -> bool {
        matches!(self.position, Position::Lower | Position::Upper)
    }

    pub fn is_prerelease(&self) -> bool {
        self.gem_version.is_prerelease()
    }

    /// Artifacts to install for this version. With `force_ruby_platform`
    /// only the platform-independent artifacts are returned.
    pub fn to_specs(&self, force_ruby_platform: bool) -> Vec<Artifact> {
        self.spec_group
            .iter()
            .filter(|spec| !force_ruby_platform || spec.platform.is_ruby())
            .cloned()
            .collect()
    }

    /// Runtime dependencies of every artifact in the group, first occurrence kept
    pub fn dependencies(&self) -> Vec<Dependency> {
        let mut dependencies: Vec<Dependency> = Vec::new();
        for dependency in self
            .spec_group
            .iter()
            .flat_map(|spec| spec.runtime_dependencies())
        {
            if !dependencies.contains(dependency) {
                dependencies.push(dependency.clone());
            }
        }
        dependencies
    }

}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gem_version
            .cmp(&other.gem_version)
            .then(self.position.cmp(&other.position))
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

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.gem_version.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_endpoint() || self.is_ruby_only() {
            write!(f, "{}", self.gem_version)
        } else {
            let platforms = self
                .platforms
                .iter()
                .map(|platform| platform.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "{} ({platforms})", self.gem_version)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garnet_core::types::Requirement;

    fn gv(s: &str) -> GemVersion {
        s.parse().unwrap()
    }

    fn artifact(version: &str, platform: &str) -> Artifact {
        Artifact::new("nokogiri", gv(version)).with_platform(platform.parse().unwrap())
    }

    #[test]
    fn test_ruby_only_sorts_first() {
        let ruby = Version::new(gv("1.0"), vec![artifact("1.0", "ruby")]);
        let native = Version::new(
            gv("1.0"),
            vec![artifact("1.0", "ruby"), artifact("1.0", "x86_64-linux")],
        );
        assert!(ruby.is_ruby_only());
        assert!(!native.is_ruby_only());
        assert!(ruby < native);
        assert_ne!(ruby, native);
    }

    #[test]
    fn test_endpoints_enclose_every_variant() {
        let lower = Version::lower_bound(gv("1.0"));
        let upper = Version::upper_bound(gv("1.0"));
        let ruby = Version::new(gv("1.0"), vec![artifact("1.0", "ruby")]);
        let native = Version::new(gv("1.0"), vec![artifact("1.0", "x86_64-linux")]);

        let mut values = vec![upper.clone(), native.clone(), lower.clone(), ruby.clone()];
        values.sort();
        assert_eq!(values, vec![lower.clone(), ruby, native.clone(), upper.clone()]);
        assert_ne!(lower, native);
        assert!(lower.is_endpoint() && upper.is_endpoint());
        assert!(Version::upper_bound(gv("0.9")) < lower);
        assert!(upper < Version::lower_bound(gv("1.0.1")));
    }

    #[test]
    fn test_order_is_transitive_across_variants() {
        let values = [
            Version::lower_bound(gv("1.0")),
            Version::new(gv("1.0"), vec![artifact("1.0", "ruby")]),
            Version::new(gv("1.0"), vec![artifact("1.0", "ruby"), artifact("1.0", "x86_64-linux")]),
            Version::upper_bound(gv("1.0")),
            Version::lower_bound(gv("1.1")),
        ];
        for (i, a) in values.iter().enumerate() {
            for (j, b) in values.iter().enumerate() {
                assert_eq!(a.cmp(b), i.cmp(&j));
            }
        }
    }

    #[test]
    fn test_display() {
        let native = Version::new(
            gv("1.0"),
            vec![artifact("1.0", "x86_64-linux"), artifact("1.0", "ruby")],
        );
        assert_eq!(native.to_string(), "1.0 (ruby, x86_64-linux)");
        assert_eq!(Version::lower_bound(gv("2.1")).to_string(), "2.1");
        assert_eq!(Version::upper_bound(gv("2.1")).to_string(), "2.1");
        assert_eq!(
            Version::new(gv("1.0"), vec![artifact("1.0", "ruby")]).to_string(),
            "1.0"
        );
    }

    #[test]
    fn test_to_specs_force_ruby() {
        let version = Version::new(
            gv("1.0"),
            vec![artifact("1.0", "ruby"), artifact("1.0", "x86_64-linux")],
        );
        assert_eq!(version.to_specs(false).len(), 2);
        let forced = version.to_specs(true);
        assert_eq!(forced.len(), 1);
        assert!(forced[0].platform.is_ruby());
    }

    #[test]
    fn test_group_dependencies_deduplicated() {
        let dep = garnet_core::types::Dependency::new("mini_portile2", Requirement::parse_list("~> 2.8"));
        let version = Version::new(
            gv("1.0"),
            vec![
                artifact("1.0", "ruby").with_dependency(dep.clone()),
                artifact("1.0", "x86_64-linux").with_dependency(dep),
            ],
        );
        assert_eq!(version.dependencies().len(), 1);
    }
}
