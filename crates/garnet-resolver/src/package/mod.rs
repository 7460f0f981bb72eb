//! Package identities and per-package policy
//!
//! A [`Package`] is the token handed to the solver; it is cheap to clone and
//! compares by `(name, root)`. Everything that may change during a run lives
//! in a [`PackagePolicy`] owned by the [`PackageRegistry`].

use garnet_core::types::{GemVersion, Platform};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name of the synthetic root package
pub const ROOT_NAME: &str = "root";

/// Solver-facing package identity
#[derive(Debug, Clone)]
pub struct Package {
    name: Arc<str>,
    root: bool,
    synthetic: bool,
}

/// Stable handle into a [`PackageRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(usize);

/// Mutable resolution policy of one package
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackagePolicy {
    /// Platforms to resolve for, in request order
    pub platforms: Vec<Platform>,
    /// Version recorded in the locked set
    pub locked_version: Option<GemVersion>,
    /// Whether the locked version may change
    pub unlock: bool,
    /// Only consider platform-independent artifacts
    pub force_ruby_platform: bool,
    /// A requirement on this package names a prerelease
    pub prerelease_specified: bool,
}

/// Interned packages and their policies
#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: IndexMap<Package, PackagePolicy>,
}

impl Package {
    /// Regular package
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            root: false,
            synthetic: false,
        }
    }

    /// The root package every requirement hangs off
    pub fn root() -> Self {
        Self {
            name: Arc::from(ROOT_NAME),
            root: true,
            synthetic: false,
        }
    }

    /// Pseudo-package describing current state (e.g. the running interpreter)
    pub fn synthetic(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            root: false,
            synthetic: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.name == other.name
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.root.hash(state);
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PackagePolicy {
    /// Platforms to enumerate candidates for
    pub fn effective_platforms(&self) -> Vec<Platform> {
        if self.force_ruby_platform {
            vec![Platform::Ruby]
        } else {
            self.platforms.clone()
        }
    }

    /// Add platforms not yet present, keeping the existing order
    pub fn widen_platforms(&mut self, platforms: &[Platform]) {
        for platform in platforms {
            if !self.platforms.contains(platform) {
                self.platforms.push(platform.clone());
            }
        }
    }
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `package`, creating its policy with `init` on first sight.
    /// A repeated reference only widens the recorded platforms.
    pub fn intern(
        &mut self,
        package: Package,
        init: impl FnOnce() -> PackagePolicy,
    ) -> PackageId {
        let index = match self.packages.entry(package) {
            Entry::Occupied(entry) => entry.index(),
            Entry::Vacant(entry) => {
                let index = entry.index();
                entry.insert(init());
                index
            },
        };
        PackageId(index)
    }

    /// Intern `package` with an explicit platform set, widening if it exists
    pub fn intern_with_platforms(
        &mut self,
        package: Package,
        platforms: &[Platform],
        init: impl FnOnce() -> PackagePolicy,
    ) -> PackageId {
        let id = self.intern(package, init);
        if let Some((_, policy)) = self.packages.get_index_mut(id.0) {
            policy.widen_platforms(platforms);
        }
        id
    }

    pub fn id_of(&self, package: &Package) -> Option<PackageId> {
        self.packages.get_index_of(package).map(PackageId)
    }

    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get_index(id.0).map(|(package, _)| package)
    }

    pub fn policy(&self, id: PackageId) -> Option<&PackagePolicy> {
        self.packages.get_index(id.0).map(|(_, policy)| policy)
    }

    pub fn policy_mut(&mut self, id: PackageId) -> Option<&mut PackagePolicy> {
        self.packages.get_index_mut(id.0).map(|(_, policy)| policy)
    }

    /// Look up a regular package by name
    pub fn find(&self, name: &str) -> Option<PackageId> {
        self.id_of(&Package::new(name))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Package, &PackagePolicy)> {
        self.packages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> Platform {
        "x86_64-linux".parse().unwrap()
    }

    #[test]
    fn test_identity_ignores_synthetic_flag() {
        assert_eq!(Package::new("ruby"), Package::synthetic("ruby"));
        assert_ne!(Package::new(ROOT_NAME), Package::root());
    }

    #[test]
    fn test_display_is_plain_name() {
        assert_eq!(Package::synthetic("Ruby").to_string(), "Ruby");
        assert_eq!(Package::root().to_string(), "root");
    }

    #[test]
    fn test_intern_is_stable() {
        let mut registry = PackageRegistry::new();
        let first = registry.intern(Package::new("rack"), PackagePolicy::default);
        let second = registry.intern(Package::new("rack"), || panic!("must not re-create"));
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.package(first).unwrap().name(), "rack");
    }

    #[test]
    fn test_platforms_only_widen() {
        let mut registry = PackageRegistry::new();
        let id = registry.intern_with_platforms(
            Package::new("nokogiri"),
            &[Platform::Ruby],
            PackagePolicy::default,
        );
        registry.intern_with_platforms(
            Package::new("nokogiri"),
            &[linux(), Platform::Ruby],
            PackagePolicy::default,
        );
        assert_eq!(
            registry.policy(id).unwrap().platforms,
            vec![Platform::Ruby, linux()]
        );
    }

    #[test]
    fn test_force_ruby_platform() {
        let policy = PackagePolicy {
            platforms: vec![linux()],
            force_ruby_platform: true,
            ..Default::default()
        };
        assert_eq!(policy.effective_platforms(), vec![Platform::Ruby]);
    }
}
