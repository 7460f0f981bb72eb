//! Core data types for Garnet dependency resolution.
//!
//! This module provides the fundamental types used throughout Garnet:
//! - Gem version numbers and platforms
//! - Textual requirements and dependencies
//! - Artifacts offered by sources

pub mod artifact;
pub mod dependency;
pub mod platform;
pub mod requirement;
pub mod version;

// Re-export all public types
pub use artifact::{Artifact, Origin};
pub use dependency::{Dependency, DependencyKind};
pub use platform::{Platform, PlatformError, Specificity};
pub use requirement::{Comparator, Op, Requirement, RequirementError};
pub use version::{GemVersion, Segment, VersionError};
