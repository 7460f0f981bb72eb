//! Artifact sources
//!
//! A [`Source`] answers "which artifacts exist for this name". The resolver
//! only reads from sources; fetching and caching remote indices happens
//! before resolution starts.

use camino::{Utf8Path, Utf8PathBuf};
use garnet_core::types::Artifact;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Searchable collection of artifacts
pub trait Source: fmt::Display {
    /// Every artifact published under `name`, in any order
    fn search(&self, name: &str) -> Vec<Artifact>;
}

/// Location of locally cached artifacts, mentioned in not-found messages
pub trait ArtifactCache {
    /// The cache location, only when it is actually reachable
    fn location(&self) -> Option<&Utf8Path>;
}

/// Source backed by an in-memory list of artifacts
#[derive(Debug, Clone)]
pub struct InMemoryIndex {
    name: String,
    artifacts: IndexMap<String, Vec<Artifact>>,
}

/// Source table: per-name overrides plus a default source
#[derive(Clone)]
pub struct SourceMap {
    default: Arc<dyn Source>,
    overrides: HashMap<String, Arc<dyn Source>>,
}

/// Artifact cache rooted in a directory
#[derive(Debug, Clone)]
pub struct DirectoryCache {
    path: Utf8PathBuf,
}

#[derive(Deserialize)]
struct IndexSnapshot {
    name: String,
    artifacts: Vec<Artifact>,
}

impl InMemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifacts: IndexMap::new(),
        }
    }

    /// Load a snapshot of the form `{"name": ..., "artifacts": [...]}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let snapshot: IndexSnapshot = serde_json::from_str(json)?;
        let mut index = Self::new(snapshot.name);
        index.extend(snapshot.artifacts);
        Ok(index)
    }

    pub fn add(&mut self, artifact: Artifact) {
        self.artifacts
            .entry(artifact.name.clone())
            .or_default()
            .push(artifact);
    }

    pub fn with(mut self, artifact: Artifact) -> Self {
        self.add(artifact);
        self
    }

    pub fn len(&self) -> usize {
        self.artifacts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Extend<Artifact> for InMemoryIndex {
    fn extend<T: IntoIterator<Item = Artifact>>(&mut self, iter: T) {
        for artifact in iter {
            self.add(artifact);
        }
    }
}

impl Source for InMemoryIndex {
    fn search(&self, name: &str) -> Vec<Artifact> {
        self.artifacts.get(name).cloned().unwrap_or_default()
    }
}

impl fmt::Display for InMemoryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl SourceMap {
    pub fn new(default: Arc<dyn Source>) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Pin `name` to a specific source
    pub fn with_override(mut self, name: impl Into<String>, source: Arc<dyn Source>) -> Self {
        self.overrides.insert(name.into(), source);
        self
    }

    /// Source responsible for `name`
    pub fn source_for(&self, name: &str) -> &Arc<dyn Source> {
        self.overrides.get(name).unwrap_or(&self.default)
    }
}

impl fmt::Debug for SourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceMap")
            .field("default", &self.default.to_string())
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DirectoryCache {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtifactCache for DirectoryCache {
    fn location(&self) -> Option<&Utf8Path> {
        self.path.is_dir().then_some(self.path.as_path())
    }
}
