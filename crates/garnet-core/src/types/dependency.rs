//! Dependency specification types.

use super::Requirement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named dependency with its requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(default)]
    pub kind: DependencyKind,
}

/// Type of dependency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Needed whenever the artifact is used
    #[default]
    Runtime,
    /// Only needed to work on the artifact itself
    Development,
}

impl Dependency {
    /// Create a new runtime dependency
    pub fn new(name: impl Into<String>, requirement: Requirement) -> Self {
        Self {
            name: name.into(),
            requirement,
            kind: DependencyKind::Runtime,
        }
    }

    /// Create a development dependency
    pub fn development(name: impl Into<String>, requirement: Requirement) -> Self {
        Self {
            name: name.into(),
            requirement,
            kind: DependencyKind::Development,
        }
    }

    /// Shorthand for `Dependency::new(name, Requirement::parse_list(text))`
    pub fn parse(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, Requirement::parse_list(text))
    }
}

impl DependencyKind {
    /// Check if this dependency takes part in resolution
    pub fn is_runtime(&self) -> bool {
        matches!(self, DependencyKind::Runtime)
    }
}

impl fmt::Display for Dependency {
    /// `name` for unconstrained dependencies, `name (req)` otherwise
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requirement.is_any() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.requirement)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Dependency::new("rack", Requirement::any()).to_string(), "rack");
        assert_eq!(
            Dependency::parse("rack", "~> 2.0, >= 2.0.1").to_string(),
            "rack (~> 2.0, >= 2.0.1)"
        );
    }

    #[test]
    fn test_kinds() {
        assert!(Dependency::parse("rack", ">= 0").kind.is_runtime());
        assert!(!Dependency::development("rspec", Requirement::any())
            .kind
            .is_runtime());
    }

    #[test]
    fn test_deserialize_defaults() {
        let dep: Dependency = serde_json::from_str(r#"{"name":"rake"}"#).unwrap();
        assert!(dep.requirement.is_any());
        assert_eq!(dep.kind, DependencyKind::Runtime);
    }
}
