//! Dependency resolution core for Garnet
//!
//! This crate adapts gem indices to the PubGrub version solver: it enumerates
//! platform-aware candidate versions, compresses per-version dependencies
//! into range incompatibilities and turns solver results back into the
//! artifacts to install.
//!
//! ## Architecture
//!
//! - `version` / `package` / `requirement`: solver values, identities and ranges
//! - `universe`: candidate lookup, locked filtering, exclusion, pre-flight checks
//! - `source`: the incompatibility source handed to the solver
//! - `solver`: the `pubgrub` bridge
//! - `resolver`: the entry point tying it together
//! - `report`: user-facing failure messages

pub mod cache;
pub mod error;
pub mod index;
pub mod package;
pub mod promoter;
pub mod report;
pub mod requirement;
pub mod resolver;
pub mod solver;
pub mod source;
pub mod universe;
pub mod version;

// Re-export main types
pub use error::{ConflictTree, ResolveError};
pub use index::{ArtifactCache, DirectoryCache, InMemoryIndex, Source, SourceMap};
pub use package::{Package, PackageId, PackagePolicy};
pub use promoter::{PreferencePolicy, VersionPromoter};
pub use requirement::VersionRange;
pub use resolver::{resolve, Resolver};
pub use source::{IncompatibilitySource, PackageSource};
pub use universe::{PackageUniverse, RootRequirement};
pub use version::Version;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ResolveError>;
