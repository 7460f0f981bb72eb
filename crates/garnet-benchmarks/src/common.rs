//! Common utilities for benchmarks

use criterion::Criterion;
use garnet_core::types::{Artifact, Dependency, GemVersion};
use garnet_resolver::{InMemoryIndex, Source, SourceMap};
use pprof::criterion::{Output, PProfProfiler};
use std::sync::Arc;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

fn version(major: usize, minor: usize) -> GemVersion {
    format!("{major}.{minor}")
        .parse()
        .unwrap_or_else(|_| GemVersion::zero())
}

/// `depth` packages `p0 -> p1 -> ...`, each with `versions` releases.
///
/// Every release of a package carries the same requirement on the next
/// package, so each dependency edge compresses to a single clause.
pub fn chain_index(depth: usize, versions: usize) -> InMemoryIndex {
    let mut index = InMemoryIndex::new("benchmark index");
    for package in 0..depth {
        for minor in 0..versions {
            let mut artifact = Artifact::new(format!("p{package}"), version(1, minor));
            if package + 1 < depth {
                artifact = artifact.with_dependency(Dependency::parse(&format!("p{}", package + 1), "~> 1.0"));
            }
            index.add(artifact);
        }
    }
    index
}

/// One package `wide` with `versions` releases whose requirement on `dep`
/// changes every `run` releases.
pub fn stepped_index(versions: usize, run: usize) -> InMemoryIndex {
    let mut index = InMemoryIndex::new("benchmark index");
    for minor in 0..versions {
        let floor = minor / run.max(1);
        index.add(
            Artifact::new("wide", version(1, minor))
                .with_dependency(Dependency::parse("dep", &format!(">= {floor}"))),
        );
    }
    for major in 0..=versions / run.max(1) {
        index.add(Artifact::new("dep", version(major, 0)));
    }
    index
}

pub fn source_map(index: InMemoryIndex) -> SourceMap {
    let source: Arc<dyn Source> = Arc::new(index);
    SourceMap::new(source)
}
