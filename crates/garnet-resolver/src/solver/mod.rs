//! PubGrub bridge
//!
//! Drives `pubgrub::resolve` from a [`PackageSource`]. Compressed
//! incompatibilities are lowered back into the per-version dependency maps
//! the solver asks for; a malformed requirement makes the version
//! unavailable instead of failing the run.

use crate::error::ResolveError;
use crate::package::Package;
use crate::report;
use crate::requirement::VersionRange;
use crate::source::{IncompatibilityCause, PackageSource};
use crate::version::Version;
use indexmap::IndexMap;
use pubgrub::{
    Dependencies, DependencyConstraints, DependencyProvider, PackageResolutionStatistics,
    PubGrubError,
};
use std::cell::RefCell;
use std::cmp::Reverse;
use tracing::{debug, info};

/// `DependencyProvider` over a package source
pub struct SolverBridge<'s, S: PackageSource> {
    source: &'s S,
    explanations: RefCell<IndexMap<Package, String>>,
}

impl<'s, S: PackageSource> SolverBridge<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            explanations: RefCell::new(IndexMap::new()),
        }
    }

    /// Custom explanations seen so far, keyed by the depended-on package
    pub fn explanations(&self) -> IndexMap<Package, String> {
        self.explanations.borrow().clone()
    }
}

impl<S: PackageSource> DependencyProvider for SolverBridge<'_, S> {
    type P = Package;
    type V = Version;
    type VS = VersionRange;
    type M = String;
    type Err = ResolveError;
    type Priority = Reverse<usize>;

    /// Packages with fewer remaining candidates are decided first.
    fn prioritize(
        &self,
        package: &Package,
        range: &VersionRange,
        _stats: &PackageResolutionStatistics,
    ) -> Self::Priority {
        match self.source.versions_for(package, range) {
            Ok(versions) => Reverse(versions.len()),
            Err(err) => {
                // Highest priority, so `choose_version` runs next and returns the error.
                debug!(package = %package, error = %err, "candidate lookup failed");
                Reverse(0)
            },
        }
    }

    fn choose_version(
        &self,
        package: &Package,
        range: &VersionRange,
    ) -> Result<Option<Version>, ResolveError> {
        let chosen = self.source.versions_for(package, range)?.into_iter().next();
        debug!(package = %package, chosen = ?chosen.as_ref().map(ToString::to_string), "choose version");
        Ok(chosen)
    }

    fn get_dependencies(
        &self,
        package: &Package,
        version: &Version,
    ) -> Result<Dependencies<Package, VersionRange, String>, ResolveError> {
        let mut constraints = DependencyConstraints::default();
        for incompatibility in self.source.incompatibilities_for(package, version)? {
            match &incompatibility.cause {
                IncompatibilityCause::InvalidDependency { package: dependency, requirement } => {
                    return Ok(Dependencies::Unavailable(format!(
                        "{dependency} has an invalid requirement `{requirement}`"
                    )));
                },
                IncompatibilityCause::Dependency => {
                    let Some(dependency) = incompatibility.dependency_constraint() else {
                        continue;
                    };
                    if let Some(explanation) = &incompatibility.custom_explanation {
                        self.explanations
                            .borrow_mut()
                            .insert(dependency.package.clone(), explanation.clone());
                    }
                    constraints.insert(dependency.package.clone(), dependency.range.clone());
                },
            }
        }
        Ok(Dependencies::Available(constraints))
    }
}

/// Run the solver from the source's root.
///
/// Returns every selected `(package, version)` pair, root included.
pub fn solve<S: PackageSource>(source: &S) -> Result<Vec<(Package, Version)>, ResolveError> {
    let bridge = SolverBridge::new(source);
    let root = source.root_package().clone();
    let root_version = source.root_version().clone();

    info!(requirements = source.root_dependencies().len(), "solving");
    match pubgrub::resolve(&bridge, root, root_version) {
        Ok(solution) => {
            let selected: Vec<(Package, Version)> = solution.into_iter().collect();
            info!(packages = selected.len(), "solved");
            Ok(selected)
        },
        Err(PubGrubError::NoSolution(mut tree)) => {
            let explanation = report::explain_conflict(&mut tree, &bridge.explanations());
            info!("no solution");
            Err(ResolveError::Unsatisfiable {
                explanation,
                tree: Box::new(tree),
            })
        },
        Err(PubGrubError::ErrorRetrievingDependencies { source, .. }) => Err(source),
        Err(PubGrubError::ErrorChoosingVersion { source, .. }) => Err(source),
        Err(other) => Err(ResolveError::Solver {
            message: other.to_string(),
        }),
    }
}
