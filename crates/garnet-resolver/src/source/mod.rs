//! Incompatibility source
//!
//! Answers the solver's questions about packages: which versions exist in a
//! range, in what order to try them, and what each version depends on.
//!
//! Dependencies are reported as compressed incompatibilities. Adjacent
//! versions of a package that carry the identical requirement on a
//! dependency share one incompatibility whose owner range spans the whole
//! run, so a package with hundreds of releases and a stable dependency list
//! yields a handful of clauses instead of one per release.
//!
//! `pubgrub` 0.3 only accepts dependencies one `(package, version)` at a
//! time, so [`crate::solver::SolverBridge`] lowers these clauses back into
//! per-version dependency maps. The compression is observable through
//! [`PackageSource::incompatibilities_for`], not inside the solver.

mod incompatibility;

pub use incompatibility::{Constraint, Incompatibility, IncompatibilityCause, Term};

use crate::cache::MemoTable;
use crate::error::ResolveError;
use crate::package::Package;
use crate::promoter::PreferencePolicy;
use crate::requirement::{requirement_range, VersionRange};
use crate::universe::{PackageUniverse, RootRequirement};
use crate::version::Version;
use crate::ResolverResult;
use garnet_core::types::{GemVersion, Op, Requirement, RequirementError};
use indexmap::IndexMap;
use pubgrub::Ranges;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

type DependencyMap = IndexMap<Package, Requirement>;

/// What the solver needs to know about packages
pub trait PackageSource {
    fn root_package(&self) -> &Package;

    fn root_version(&self) -> &Version;

    /// Requirements of the root package, one entry per package
    fn root_dependencies(&self) -> &IndexMap<Package, Requirement>;

    /// Candidates of `package` inside `range`, most preferred first
    fn versions_for(&self, package: &Package, range: &VersionRange) -> ResolverResult<Vec<Version>>;

    /// Dependency incompatibilities of `version`
    fn incompatibilities_for(
        &self,
        package: &Package,
        version: &Version,
    ) -> ResolverResult<Vec<Incompatibility>>;

    /// Range matched by a requirement on `package`
    fn parse_dependency(
        &self,
        package: &Package,
        requirement: &Requirement,
    ) -> Result<VersionRange, RequirementError>;
}

/// [`PackageSource`] over a [`PackageUniverse`]
pub struct IncompatibilitySource<'a> {
    universe: &'a PackageUniverse,
    promoter: &'a dyn PreferencePolicy,
    root: Package,
    root_version: Version,
    root_dependencies: DependencyMap,
    sorted_versions: RefCell<MemoTable<Package, Rc<Vec<Version>>>>,
    preferred_versions: RefCell<MemoTable<Package, Rc<Vec<Version>>>>,
    dependency_maps: RefCell<MemoTable<(Package, usize), Rc<DependencyMap>>>,
}

impl<'a> IncompatibilitySource<'a> {
    /// Register `requirements` with the universe and hang them off the root.
    /// Several requirements on one name merge into one.
    pub fn new(
        universe: &'a PackageUniverse,
        promoter: &'a dyn PreferencePolicy,
        requirements: &[RootRequirement],
    ) -> Self {
        let mut root_dependencies = DependencyMap::new();
        for requirement in requirements {
            let package = universe.register_requirement(requirement);
            add_requirement(&mut root_dependencies, package, &requirement.dependency.requirement);
        }
        Self {
            universe,
            promoter,
            root: Package::root(),
            root_version: Version::lower_bound(GemVersion::zero()),
            root_dependencies,
            sorted_versions: RefCell::new(MemoTable::new()),
            preferred_versions: RefCell::new(MemoTable::new()),
            dependency_maps: RefCell::new(MemoTable::new()),
        }
    }

    pub fn universe(&self) -> &PackageUniverse {
        self.universe
    }

    /// Every candidate of `package`, ascending
    fn sorted_versions(&self, package: &Package) -> ResolverResult<Rc<Vec<Version>>> {
        if package.is_root() {
            return Ok(Rc::new(vec![self.root_version.clone()]));
        }
        if let Some(versions) = self.sorted_versions.borrow_mut().lookup(package) {
            return Ok(versions);
        }
        let mut versions = self.universe.versions_for(package)?.to_vec();
        versions.sort();
        Ok(self
            .sorted_versions
            .borrow_mut()
            .store(package.clone(), Rc::new(versions)))
    }

    /// Every candidate of `package`, least preferred first
    fn preferred_versions(&self, package: &Package) -> ResolverResult<Rc<Vec<Version>>> {
        if let Some(versions) = self.preferred_versions.borrow_mut().lookup(package) {
            return Ok(versions);
        }
        let versions = self.universe.versions_for(package)?.to_vec();
        let policy = self.universe.policy(package);
        let sorted = self.promoter.sort_versions(package, &policy, versions);
        Ok(self
            .preferred_versions
            .borrow_mut()
            .store(package.clone(), Rc::new(sorted)))
    }

    /// Dependencies of the candidate at `index` in the sorted list
    fn dependencies_at(&self, package: &Package, index: usize) -> ResolverResult<Rc<DependencyMap>> {
        if package.is_root() {
            return Ok(Rc::new(self.root_dependencies.clone()));
        }
        let key = (package.clone(), index);
        if let Some(dependencies) = self.dependency_maps.borrow_mut().lookup(&key) {
            return Ok(dependencies);
        }

        let versions = self.sorted_versions(package)?;
        let mut dependencies = DependencyMap::new();
        if let Some(version) = versions.get(index) {
            for dependency in version.dependencies() {
                let dependency_package = self.universe.intern(&dependency.name);
                add_requirement(&mut dependencies, dependency_package, &dependency.requirement);
            }
        }
        Ok(self
            .dependency_maps
            .borrow_mut()
            .store(key, Rc::new(dependencies)))
    }

    fn carries(
        &self,
        package: &Package,
        index: usize,
        dependency: &Package,
        requirement: &Requirement,
    ) -> ResolverResult<bool> {
        Ok(self.dependencies_at(package, index)?.get(dependency) == Some(requirement))
    }

    /// Owner range of the run `[low, high)` of sorted candidates
    fn run_range(versions: &[Version], low: usize, high: usize) -> VersionRange {
        match (low == 0, high >= versions.len()) {
            (true, true) => Ranges::full(),
            (true, false) => Ranges::strictly_lower_than(versions[high].clone()),
            (false, true) => Ranges::higher_than(versions[low].clone()),
            (false, false) => Ranges::between(versions[low].clone(), versions[high].clone()),
        }
    }
}

fn add_requirement(map: &mut DependencyMap, package: Package, requirement: &Requirement) {
    match map.get_mut(&package) {
        Some(existing) => *existing = existing.merge(requirement),
        None => {
            map.insert(package, requirement.clone());
        },
    }
}

/// `3.2.2` for `= 3.2.2`, the requirement text otherwise
fn current_version_text(requirement: &Requirement) -> String {
    match requirement.comparators().as_deref() {
        Ok([comparator]) if comparator.op == Op::Eq => comparator.version.to_string(),
        _ => requirement.to_string(),
    }
}

impl PackageSource for IncompatibilitySource<'_> {
    fn root_package(&self) -> &Package {
        &self.root
    }

    fn root_version(&self) -> &Version {
        &self.root_version
    }

    fn root_dependencies(&self) -> &IndexMap<Package, Requirement> {
        &self.root_dependencies
    }

    fn versions_for(&self, package: &Package, range: &VersionRange) -> ResolverResult<Vec<Version>> {
        if package.is_root() {
            return Ok(if range.contains(&self.root_version) {
                vec![self.root_version.clone()]
            } else {
                Vec::new()
            });
        }
        Ok(self
            .preferred_versions(package)?
            .iter()
            .rev()
            .filter(|version| range.contains(version))
            .cloned()
            .collect())
    }

    fn incompatibilities_for(
        &self,
        package: &Package,
        version: &Version,
    ) -> ResolverResult<Vec<Incompatibility>> {
        let versions = self.sorted_versions(package)?;
        let index = versions
            .iter()
            .position(|candidate| candidate == version)
            .ok_or_else(|| ResolveError::Solver {
                message: format!("{package} {version} is not a known candidate"),
            })?;

        let dependencies = self.dependencies_at(package, index)?;
        let mut incompatibilities = Vec::with_capacity(dependencies.len());

        for (dependency, requirement) in dependencies.iter() {
            let range = match self.parse_dependency(dependency, requirement) {
                Ok(range) => range,
                Err(e) if e.is_unknown_operator() => {
                    return Err(ResolveError::configuration(
                        dependency.name(),
                        requirement.to_string(),
                        e,
                    ));
                },
                Err(e) => {
                    debug!(package = %package, version = %version, dependency = %dependency, error = %e, "invalid dependency");
                    let owner = Constraint::new(package.clone(), Ranges::singleton(version.clone()));
                    return Ok(vec![Incompatibility::invalid_dependency(
                        owner,
                        dependency.clone(),
                        requirement.to_string(),
                    )]);
                },
            };

            let mut low = index;
            while low > 0 && self.carries(package, low - 1, dependency, requirement)? {
                low -= 1;
            }
            let mut high = index + 1;
            while high < versions.len() && self.carries(package, high, dependency, requirement)? {
                high += 1;
            }

            let owner = Constraint::new(package.clone(), Self::run_range(&versions, low, high));
            let mut incompatibility =
                Incompatibility::dependency(owner, Constraint::new(dependency.clone(), range));
            if package.is_root() && dependency.is_synthetic() {
                incompatibility = incompatibility.with_explanation(format!(
                    "current {dependency} version is {}",
                    current_version_text(requirement)
                ));
            }
            incompatibilities.push(incompatibility);
        }

        debug!(
            package = %package,
            version = %version,
            count = incompatibilities.len(),
            "built dependency incompatibilities"
        );
        Ok(incompatibilities)
    }

    fn parse_dependency(
        &self,
        _package: &Package,
        requirement: &Requirement,
    ) -> Result<VersionRange, RequirementError> {
        requirement_range(requirement)
    }
}
