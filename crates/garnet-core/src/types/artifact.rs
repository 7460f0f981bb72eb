//! Installable artifacts and where they come from.

use super::{Dependency, GemVersion, Platform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One concrete (name, version, platform) build of a gem
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub version: GemVersion,
    #[serde(default = "ruby_platform")]
    pub platform: Platform,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub origin: Origin,
}

/// Kind of source an artifact was obtained from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "location", rename_all = "lowercase")]
pub enum Origin {
    /// Remote gem server
    Registry(String),
    /// Git checkout
    Git(String),
    /// Local directory
    Path(String),
    /// The project's own gemspec
    Gemspec(String),
}

fn ruby_platform() -> Platform {
    Platform::Ruby
}

impl Default for Origin {
    fn default() -> Self {
        Origin::Registry("https://rubygems.org".to_string())
    }
}

impl Origin {
    /// Artifacts from trusted origins satisfy any requirement on their name.
    pub fn is_trusted(&self) -> bool {
        match self {
            Origin::Gemspec(_) => true,
            Origin::Registry(_) | Origin::Git(_) | Origin::Path(_) => false,
        }
    }
}

impl Artifact {
    /// Create a platform-independent artifact with no dependencies
    pub fn new(name: impl Into<String>, version: GemVersion) -> Self {
        Self {
            name: name.into(),
            version,
            platform: Platform::Ruby,
            dependencies: Vec::new(),
            origin: Origin::default(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// `name-version` or `name-version-platform`
    pub fn full_name(&self) -> String {
        if self.platform.is_ruby() {
            format!("{}-{}", self.name, self.version)
        } else {
            format!("{}-{}-{}", self.name, self.version, self.platform)
        }
    }

    /// Dependencies that take part in resolution
    pub fn runtime_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|dep| dep.kind.is_runtime())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
