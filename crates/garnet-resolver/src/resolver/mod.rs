//! Resolution entry point
//!
//! [`Resolver::start`] runs one resolution:
//! 1. apply exclusions to the universe
//! 2. register and pre-flight the root requirements
//! 3. solve over an [`IncompatibilitySource`]
//! 4. turn the selected versions into artifacts

use crate::index::{ArtifactCache, DirectoryCache, SourceMap};
use crate::package::Package;
use crate::promoter::{PreferencePolicy, VersionPromoter};
use crate::solver;
use crate::source::IncompatibilitySource;
use crate::universe::{Base, PackageUniverse, RootRequirement};
use crate::version::Version;
use crate::ResolverResult;
use garnet_config::ResolverSettings;
use garnet_core::types::{Artifact, Dependency};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Resolves root requirements against a universe of candidates
pub struct Resolver {
    universe: PackageUniverse,
    promoter: Box<dyn PreferencePolicy>,
}

impl Resolver {
    /// Resolver with default settings.
    ///
    /// `base` is the locked set; `additional` replaces the exact requirement
    /// a locked artifact would impose on its name.
    pub fn new(
        sources: SourceMap,
        base: Vec<Artifact>,
        promoter: Box<dyn PreferencePolicy>,
        additional: Vec<Dependency>,
    ) -> Self {
        Self::with_settings(sources, base, promoter, additional, &ResolverSettings::default())
    }

    pub fn with_settings(
        sources: SourceMap,
        base: Vec<Artifact>,
        promoter: Box<dyn PreferencePolicy>,
        additional: Vec<Dependency>,
        settings: &ResolverSettings,
    ) -> Self {
        let mut universe = PackageUniverse::new(sources, Base::new(base, additional), settings);
        if let Some(path) = &settings.app_cache_path {
            universe = universe.with_app_cache(Arc::new(DirectoryCache::new(path.clone())));
        }
        Self { universe, promoter }
    }

    /// Resolver whose preference policy follows `settings`
    pub fn from_settings(sources: SourceMap, base: Vec<Artifact>, settings: &ResolverSettings) -> Self {
        let promoter = Box::new(VersionPromoter::from_settings(settings));
        Self::with_settings(sources, base, promoter, Vec::new(), settings)
    }

    pub fn with_app_cache(mut self, cache: Arc<dyn ArtifactCache>) -> Self {
        self.universe = self.universe.with_app_cache(cache);
        self
    }

    pub fn universe(&self) -> &PackageUniverse {
        &self.universe
    }

    /// Resolve `requirements`, never selecting an artifact in `exclude`.
    ///
    /// Returns the artifacts to install, ordered by name.
    pub fn start(
        &mut self,
        requirements: Vec<RootRequirement>,
        exclude: &[Artifact],
    ) -> ResolverResult<Vec<Artifact>> {
        info!(
            requirements = requirements.len(),
            excluded = exclude.len(),
            "starting resolution"
        );
        for artifact in exclude {
            self.universe.exclude(artifact);
        }
        for requirement in &requirements {
            self.universe.register_requirement(requirement);
        }

        let requirements = self.universe.verify_root_requirements(requirements)?;
        let source = IncompatibilitySource::new(&self.universe, self.promoter.as_ref(), &requirements);
        let solution = solver::solve(&source)?;

        let artifacts = self.materialize(solution);
        info!(artifacts = artifacts.len(), "resolution finished");
        Ok(artifacts)
    }

    fn materialize(&self, mut solution: Vec<(Package, Version)>) -> Vec<Artifact> {
        solution.retain(|(package, _)| !package.is_root());
        solution.sort_by(|(a, _), (b, _)| a.name().cmp(b.name()));

        let mut seen = HashSet::new();
        let mut artifacts = Vec::new();
        for (package, version) in solution {
            let force_ruby_platform = self.universe.policy(&package).force_ruby_platform;
            for spec in version.to_specs(force_ruby_platform) {
                if seen.insert(spec.full_name()) {
                    artifacts.push(spec);
                }
            }
        }
        artifacts
    }
}

/// One-shot resolution with the given preference policy
pub fn resolve(
    requirements: Vec<RootRequirement>,
    sources: SourceMap,
    base: Vec<Artifact>,
    promoter: Box<dyn PreferencePolicy>,
    additional: Vec<Dependency>,
    exclude: &[Artifact],
) -> ResolverResult<Vec<Artifact>> {
    Resolver::new(sources, base, promoter, additional).start(requirements, exclude)
}
