//! Resolved resolver settings
//!
//! [`ResolverSettings`] is what the resolver consumes. It is produced by
//! layering config files and environment overrides (see [`crate::merge`]);
//! every field has a default so an empty configuration is valid.

use camino::Utf8PathBuf;
use garnet_core::error::GarnetError;
use garnet_core::types::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Settings consumed by the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverSettings {
    /// Platforms the resolution must cover
    pub platforms: Vec<Platform>,
    /// How far updates may move away from locked versions
    pub update_level: UpdateLevel,
    /// Prefer prereleases for every package
    pub prerelease: bool,
    /// Only consider platform-independent artifacts
    pub force_ruby_platform: bool,
    /// Which locked packages may change version
    pub unlock: Unlock,
    /// Directory holding cached artifacts, mentioned in not-found messages
    pub app_cache_path: Option<Utf8PathBuf>,
}

/// Update granularity relative to a locked version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateLevel {
    #[default]
    Major,
    Minor,
    Patch,
}

/// Unlock policy for locked packages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Unlock {
    /// Locked versions are kept
    #[default]
    None,
    /// Every package may move
    All,
    /// Only the named packages may move
    Gems(Vec<String>),
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            platforms: vec![Platform::Ruby],
            update_level: UpdateLevel::default(),
            prerelease: false,
            force_ruby_platform: false,
            unlock: Unlock::default(),
            app_cache_path: None,
        }
    }
}

impl Unlock {
    /// Check if `name` may move away from its locked version
    pub fn permits(&self, name: &str) -> bool {
        match self {
            Unlock::None => false,
            Unlock::All => true,
            Unlock::Gems(names) => names.iter().any(|gem| gem == name),
        }
    }
}

impl FromStr for UpdateLevel {
    type Err = GarnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(UpdateLevel::Major),
            "minor" => Ok(UpdateLevel::Minor),
            "patch" => Ok(UpdateLevel::Patch),
            other => Err(GarnetError::validation(
                "update-level",
                format!("expected major, minor or patch, got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for UpdateLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            UpdateLevel::Major => "major",
            UpdateLevel::Minor => "minor",
            UpdateLevel::Patch => "patch",
        };
        f.write_str(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ResolverSettings::default();
        assert_eq!(settings.platforms, vec![Platform::Ruby]);
        assert_eq!(settings.update_level, UpdateLevel::Major);
        assert!(!settings.prerelease);
        assert!(!settings.unlock.permits("rack"));
    }

    #[test]
    fn test_unlock_permits() {
        assert!(Unlock::All.permits("rack"));
        let gems = Unlock::Gems(vec!["rack".to_string()]);
        assert!(gems.permits("rack"));
        assert!(!gems.permits("rails"));
    }

    #[test]
    fn test_update_level_parse() {
        assert_eq!("Minor".parse::<UpdateLevel>().unwrap(), UpdateLevel::Minor);
        assert!("huge".parse::<UpdateLevel>().is_err());
        assert_eq!(UpdateLevel::Patch.to_string(), "patch");
    }
}
