//! Package universe
//!
//! Owns the package registry and every candidate lookup the resolver makes:
//! - artifacts per name, from the source plus the locked base
//! - solver versions per package, grouped by platform
//! - versions matching a requirement, for pre-flight checks
//!
//! Lookups are memoized per universe. Exclusions are the only invalidation.

mod base;

pub use base::Base;

use crate::cache::MemoTable;
use crate::error::ResolveError;
use crate::index::{ArtifactCache, SourceMap};
use crate::package::{Package, PackageId, PackagePolicy, PackageRegistry};
use crate::report;
use crate::version::Version;
use crate::ResolverResult;
use camino::Utf8Path;
use garnet_config::{ResolverSettings, Unlock};
use garnet_core::types::{Artifact, Dependency, GemVersion, Platform, Requirement, RequirementError};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the package manager itself; always considered available.
pub const SELF_NAME: &str = "bundler";

/// A requirement declared by the user
#[derive(Debug, Clone, PartialEq)]
pub struct RootRequirement {
    pub dependency: Dependency,
    /// Platforms this requirement applies to; `None` means the configured ones
    pub platforms: Option<Vec<Platform>>,
    /// Only install the platform-independent artifact
    pub force_ruby_platform: bool,
    /// Whether the requirement applies on the machine running the resolution
    pub current_platform: bool,
    /// Marks a current-state pseudo-package such as the interpreter version
    pub synthetic: bool,
}

impl RootRequirement {
    pub fn new(dependency: Dependency) -> Self {
        Self {
            dependency,
            platforms: None,
            force_ruby_platform: false,
            current_platform: true,
            synthetic: false,
        }
    }

    /// Shorthand for `RootRequirement::new(Dependency::parse(name, requirement))`
    pub fn parse(name: &str, requirement: &str) -> Self {
        Self::new(Dependency::parse(name, requirement))
    }

    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = Some(platforms);
        self
    }

    pub fn force_ruby_platform(mut self) -> Self {
        self.force_ruby_platform = true;
        self
    }

    /// The requirement only applies to other platforms
    pub fn not_current_platform(mut self) -> Self {
        self.current_platform = false;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.dependency.name
    }
}

#[derive(Debug, Clone)]
struct PackageDefaults {
    platforms: Vec<Platform>,
    prerelease: bool,
    force_ruby_platform: bool,
    unlock: Unlock,
}

/// Candidate artifacts and versions for every package of one resolution
pub struct PackageUniverse {
    sources: SourceMap,
    base: Base,
    defaults: PackageDefaults,
    app_cache: Option<Arc<dyn ArtifactCache>>,
    excluded: HashSet<String>,
    registry: RefCell<PackageRegistry>,
    synthetic_names: RefCell<HashSet<String>>,
    results_for: RefCell<MemoTable<String, Rc<Vec<Artifact>>>>,
    all_versions: RefCell<MemoTable<Package, Rc<Vec<Version>>>>,
    search_for: RefCell<MemoTable<Dependency, Rc<Vec<Version>>>>,
}

impl PackageUniverse {
    pub fn new(sources: SourceMap, base: Base, settings: &ResolverSettings) -> Self {
        Self {
            sources,
            base,
            defaults: PackageDefaults {
                platforms: settings.platforms.clone(),
                prerelease: settings.prerelease,
                force_ruby_platform: settings.force_ruby_platform,
                unlock: settings.unlock.clone(),
            },
            app_cache: None,
            excluded: HashSet::new(),
            registry: RefCell::new(PackageRegistry::new()),
            synthetic_names: RefCell::new(HashSet::new()),
            results_for: RefCell::new(MemoTable::new()),
            all_versions: RefCell::new(MemoTable::new()),
            search_for: RefCell::new(MemoTable::new()),
        }
    }

    pub fn with_app_cache(mut self, cache: Arc<dyn ArtifactCache>) -> Self {
        self.app_cache = Some(cache);
        self
    }

    pub fn base(&self) -> &Base {
        &self.base
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Reachable artifact cache location, if any
    pub fn app_cache_location(&self) -> Option<&Utf8Path> {
        self.app_cache.as_ref().and_then(|cache| cache.location())
    }

    fn default_policy(&self, name: &str) -> PackagePolicy {
        PackagePolicy {
            platforms: self.defaults.platforms.clone(),
            locked_version: self.base.locked_version(name).cloned(),
            unlock: self.defaults.unlock.permits(name),
            force_ruby_platform: self.defaults.force_ruby_platform,
            prerelease_specified: self.defaults.prerelease,
        }
    }

    /// The package for `name`, interned on first use
    pub fn intern(&self, name: &str) -> Package {
        let package = if self.synthetic_names.borrow().contains(name) {
            Package::synthetic(name)
        } else {
            Package::new(name)
        };
        let id = self
            .registry
            .borrow_mut()
            .intern(package, || self.default_policy(name));
        self.registry
            .borrow()
            .package(id)
            .cloned()
            .unwrap_or_else(|| Package::new(name))
    }

    /// Intern the package behind a root requirement and apply its policy
    pub fn register_requirement(&self, requirement: &RootRequirement) -> Package {
        let name = requirement.name();
        if requirement.synthetic {
            self.synthetic_names.borrow_mut().insert(name.to_string());
        }
        let package = if requirement.synthetic {
            Package::synthetic(name)
        } else {
            Package::new(name)
        };

        let mut registry = self.registry.borrow_mut();
        let id = match &requirement.platforms {
            Some(platforms) => {
                registry.intern_with_platforms(package.clone(), platforms, || PackagePolicy {
                    platforms: platforms.clone(),
                    ..self.default_policy(name)
                })
            },
            None => registry.intern(package.clone(), || self.default_policy(name)),
        };
        if let Some(policy) = registry.policy_mut(id) {
            policy.force_ruby_platform |= requirement.force_ruby_platform;
            policy.prerelease_specified |= requirement.dependency.requirement.is_prerelease();
        }
        registry.package(id).cloned().unwrap_or(package)
    }

    pub fn package_id(&self, package: &Package) -> Option<PackageId> {
        self.registry.borrow().id_of(package)
    }

    /// Policy of `package`; root and unknown packages get the defaults
    pub fn policy(&self, package: &Package) -> PackagePolicy {
        let registry = self.registry.borrow();
        registry
            .id_of(package)
            .and_then(|id| registry.policy(id))
            .cloned()
            .unwrap_or_else(|| self.default_policy(package.name()))
    }

    /// Artifacts the source offers for `name`, minus exclusions
    pub fn results_for(&self, name: &str) -> Rc<Vec<Artifact>> {
        if let Some(results) = self.results_for.borrow_mut().lookup(name) {
            return results;
        }
        let results: Vec<Artifact> = self
            .sources
            .source_for(name)
            .search(name)
            .into_iter()
            .filter(|artifact| !self.excluded.contains(&artifact.full_name()))
            .collect();
        self.results_for
            .borrow_mut()
            .store(name.to_string(), Rc::new(results))
    }

    /// Every solver version of `package`, in source order
    pub fn versions_for(&self, package: &Package) -> ResolverResult<Rc<Vec<Version>>> {
        if package.is_root() {
            return Ok(Rc::new(Vec::new()));
        }
        if let Some(versions) = self.all_versions.borrow_mut().lookup(package) {
            return Ok(versions);
        }

        let name = package.name();
        let policy = self.policy(package);

        let mut candidates: Vec<Artifact> = self.base.get(name).to_vec();
        candidates.extend(self.results_for(name).iter().cloned());

        if !policy.unlock {
            if let Some(locked) = self.base.base_requirement(name) {
                let mut kept = Vec::with_capacity(candidates.len());
                for artifact in candidates {
                    let satisfied = Self::requirement_satisfied_by(locked, &artifact)
                        .map_err(|e| ResolveError::configuration(name, locked.to_string(), e))?;
                    if satisfied {
                        kept.push(artifact);
                    }
                }
                candidates = kept;
            }
        }

        let mut groups: IndexMap<GemVersion, Vec<Artifact>> = IndexMap::new();
        for artifact in candidates {
            let group = groups.entry(artifact.version.clone()).or_default();
            if !group.iter().any(|spec| spec.full_name() == artifact.full_name()) {
                group.push(artifact);
            }
        }

        let platforms = policy.effective_platforms();
        let mut versions = Vec::new();
        for (gem_version, specs) in groups {
            let mut platform_specs: Vec<Artifact> = Vec::new();
            for platform in &platforms {
                for spec in select_best_platform_match(&specs, platform) {
                    if !platform_specs.contains(&spec) {
                        platform_specs.push(spec);
                    }
                }
            }
            if platform_specs.is_empty() {
                continue;
            }

            let ruby_specs = select_best_platform_match(&specs, &Platform::Ruby);
            if !ruby_specs.is_empty() {
                versions.push(Version::new(gem_version.clone(), ruby_specs.clone()));
            }
            if platform_specs != ruby_specs {
                versions.push(Version::new(gem_version, platform_specs));
            }
        }

        debug!(package = %package, count = versions.len(), "enumerated candidate versions");
        Ok(self
            .all_versions
            .borrow_mut()
            .store(package.clone(), Rc::new(versions)))
    }

    /// Versions of `dependency.name` containing an artifact that satisfies it
    pub fn search_for(&self, dependency: &Dependency) -> ResolverResult<Rc<Vec<Version>>> {
        if let Some(versions) = self.search_for.borrow_mut().lookup(dependency) {
            return Ok(versions);
        }

        let requirement = &dependency.requirement;
        requirement.comparators().map_err(|e| {
            ResolveError::configuration(&dependency.name, requirement.to_string(), e)
        })?;

        let package = self.intern(&dependency.name);
        let mut matching = Vec::new();
        for version in self.versions_for(&package)?.iter() {
            let mut satisfied = false;
            for spec in version.spec_group() {
                if Self::requirement_satisfied_by(requirement, spec).map_err(|e| {
                    ResolveError::configuration(&dependency.name, requirement.to_string(), e)
                })? {
                    satisfied = true;
                    break;
                }
            }
            if satisfied {
                matching.push(version.clone());
            }
        }

        Ok(self
            .search_for
            .borrow_mut()
            .store(dependency.clone(), Rc::new(matching)))
    }

    /// Trusted artifacts satisfy every requirement on their name.
    pub fn requirement_satisfied_by(
        requirement: &Requirement,
        artifact: &Artifact,
    ) -> Result<bool, RequirementError> {
        Ok(artifact.origin.is_trusted() || requirement.matches(&artifact.version)?)
    }

    /// Remove `artifact` from every candidate list, now and for later lookups
    pub fn exclude(&mut self, artifact: &Artifact) {
        let full_name = artifact.full_name();
        let from_base = self.base.delete(artifact);
        self.excluded.insert(full_name.clone());

        self.results_for.get_mut().retain(|name, results| {
            if *name == artifact.name {
                let mut kept = (**results).clone();
                kept.retain(|spec| spec.full_name() != full_name);
                *results = Rc::new(kept);
            }
            true
        });
        self.all_versions
            .get_mut()
            .invalidate(&Package::new(&artifact.name));
        self.search_for.get_mut().clear();

        debug!(artifact = %full_name, from_base, "excluded candidate");
    }

    /// Check that every root requirement has at least one candidate.
    ///
    /// Requirements that only apply to other platforms and have no candidate
    /// are dropped from the returned list.
    pub fn verify_root_requirements(
        &self,
        requirements: Vec<RootRequirement>,
    ) -> ResolverResult<Vec<RootRequirement>> {
        let mut kept = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let name = requirement.name().to_string();
            if name == SELF_NAME || !self.search_for(&requirement.dependency)?.is_empty() {
                kept.push(requirement);
                continue;
            }

            if !requirement.current_platform {
                warn!(requirement = %requirement.dependency, "dropping requirement with no candidates for this platform");
                continue;
            }

            if let Some(locked) = self.base.locked_version(&name) {
                return Err(ResolveError::UnresolvableRequirement {
                    name: name.clone(),
                    requirement: requirement.dependency.requirement.to_string(),
                    source_name: self.sources.source_for(&name).to_string(),
                    candidates: Vec::new(),
                    locked_version: Some(locked.clone()),
                    message: report::locked_gem_message(&requirement.dependency, locked),
                });
            }

            let policy = self.policy(&Package::new(&name));
            let source = self.sources.source_for(&name);
            let not_found = report::gem_not_found(
                &requirement.dependency,
                source.as_ref(),
                &policy.platforms,
                self.app_cache_location(),
                None,
            );
            return Err(ResolveError::UnresolvableRequirement {
                name,
                requirement: requirement.dependency.requirement.to_string(),
                source_name: source.to_string(),
                candidates: not_found.listed,
                locked_version: None,
                message: not_found.message,
            });
        }
        Ok(kept)
    }
}

/// Artifacts usable on `platform`, narrowed to the closest platform match
pub fn select_best_platform_match(specs: &[Artifact], platform: &Platform) -> Vec<Artifact> {
    let matching: Vec<&Artifact> = specs
        .iter()
        .filter(|spec| spec.platform.matches(platform))
        .collect();
    let Some(best) = matching
        .iter()
        .map(|spec| spec.platform.specificity(platform))
        .min()
    else {
        return Vec::new();
    };
    matching
        .into_iter()
        .filter(|spec| spec.platform.specificity(platform) == best)
        .cloned()
        .collect()
}
