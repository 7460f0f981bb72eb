//! Configuration for the Garnet resolver
//!
//! This crate parses `.garnet/config.toml` files and layers them with the
//! global config and `GARNET_*` environment overrides into a single
//! [`ResolverSettings`] value.

pub mod merge;
pub mod settings;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use settings::{ResolverSettings, Unlock, UpdateLevel};
pub use toml::{GarnetToml, ResolverSection, UnlockSpec};

use garnet_core::error::GarnetError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, GarnetError>;
