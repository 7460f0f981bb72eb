//! # garnet-core
//!
//! Core types shared across all Garnet crates.
//!
//! This crate provides:
//! - `GemVersion` with rubygems ordering, `bump` and `release`
//! - `Platform` matching and specificity ranking
//! - `Requirement` clauses and their parsed `Comparator` form
//! - `Artifact` and `Dependency` records offered by sources
//! - `GarnetError` for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (GemVersion, Platform, Artifact, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{GarnetError, GarnetResult};
pub use types::{
    Artifact, Comparator, Dependency, DependencyKind, GemVersion, Op, Origin, Platform,
    Requirement,
};
