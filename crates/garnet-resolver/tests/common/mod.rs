//! Shared fixtures for resolver integration tests

#![allow(dead_code)]

use garnet_core::types::{Artifact, Dependency};
use garnet_resolver::{InMemoryIndex, Resolver, ResolveError, RootRequirement, Source, SourceMap, VersionPromoter};
use std::sync::Arc;

/// Route resolver logs through the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn artifact(name: &str, version: &str) -> Artifact {
    Artifact::new(name, version.parse().unwrap())
}

pub fn depends(artifact: Artifact, name: &str, requirement: &str) -> Artifact {
    artifact.with_dependency(Dependency::parse(name, requirement))
}

pub fn sources(artifacts: impl IntoIterator<Item = Artifact>) -> SourceMap {
    let mut index = InMemoryIndex::new("test index");
    index.extend(artifacts);
    let source: Arc<dyn Source> = Arc::new(index);
    SourceMap::new(source)
}

pub fn resolver(artifacts: impl IntoIterator<Item = Artifact>) -> Resolver {
    Resolver::new(sources(artifacts), Vec::new(), Box::new(VersionPromoter::default()), Vec::new())
}

pub fn requirement(name: &str, requirement: &str) -> RootRequirement {
    RootRequirement::parse(name, requirement)
}

pub fn full_names(artifacts: &[Artifact]) -> Vec<String> {
    artifacts.iter().map(Artifact::full_name).collect()
}

/// Whether `text` mentions `word` as a whole word
pub fn mentions(text: &str, word: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .any(|token| token == word)
}

pub fn explanation(err: ResolveError) -> String {
    match err {
        ResolveError::Unsatisfiable { explanation, .. } => explanation,
        other => panic!("expected an unsatisfiable resolution, got {other:?}"),
    }
}
