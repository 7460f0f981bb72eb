//! Resolution errors

use crate::package::Package;
use crate::requirement::VersionRange;
use garnet_core::types::{GemVersion, RequirementError};
use pubgrub::DerivationTree;
use thiserror::Error;

/// Derivation tree of an unsatisfiable resolution
pub type ConflictTree = DerivationTree<Package, VersionRange, String>;

/// Everything that can stop a resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A requirement uses an unknown operator or cannot be parsed at the root
    #[error("Malformed requirement `{requirement}` for {name}: {source}")]
    Configuration {
        name: String,
        requirement: String,
        #[source]
        source: RequirementError,
    },

    /// A root requirement has no candidate at all
    #[error("{message}")]
    UnresolvableRequirement {
        name: String,
        requirement: String,
        source_name: String,
        candidates: Vec<String>,
        locked_version: Option<GemVersion>,
        message: String,
    },

    /// The solver proved that no assignment exists
    #[error("Could not find compatible versions\n\n{explanation}")]
    Unsatisfiable {
        explanation: String,
        tree: Box<ConflictTree>,
    },

    /// Any other solver failure
    #[error("Version solving failed: {message}")]
    Solver { message: String },
}

impl ResolveError {
    pub(crate) fn configuration(name: &str, requirement: String, source: RequirementError) -> Self {
        Self::Configuration {
            name: name.to_string(),
            requirement,
            source,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ResolveError::Configuration { source, .. } if source.is_unknown_operator() => {
                Some("Use one of =, !=, >, >=, <, <= or ~>".to_string())
            },
            ResolveError::UnresolvableRequirement {
                name,
                locked_version: Some(_),
                ..
            } => Some(format!("Try running `bundle update {name}`")),
            ResolveError::UnresolvableRequirement { .. } => {
                Some("Check the gem name spelling and the configured sources".to_string())
            },
            ResolveError::Unsatisfiable { .. } => {
                Some("Relax the conflicting requirements or update the gems involved".to_string())
            },
            _ => None,
        }
    }
}
